//! Simulated clock and launcher hardware.

use std::ops::Add;
use std::time::Duration;

use launcher_core::controller::LauncherOutputs;
use launcher_core::duty::Duty;
use launcher_core::gate::{GateActuator, GateDrive};
use launcher_core::presentation::{StatusFrame, StatusPresenter, StatusView, Tone};
use launcher_core::time::ControlInstant;

/// Milliseconds since the session started.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct SimInstant(pub u64);

impl SimInstant {
    #[must_use]
    pub const fn millis(self) -> u64 {
        self.0
    }
}

impl Add<Duration> for SimInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        let millis = u64::try_from(rhs.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(millis))
    }
}

impl ControlInstant for SimInstant {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

/// Milliseconds per encoder count while the gate opens.
pub const OPEN_MS_PER_COUNT: u64 = 5;
/// Milliseconds per encoder count while the gate closes. The close speed is
/// lower, so the arm moves slower.
pub const CLOSE_MS_PER_COUNT: u64 = 10;

/// Wheel motors, gate motor with encoder, and the indicator LED.
#[derive(Clone, Debug)]
pub struct SimHardware {
    pub wheel_a: Duty,
    pub wheel_b: Duty,
    pub gate: GateDrive,
    pub position: i32,
    /// A stalled encoder never changes, whatever the motor does.
    pub stalled: bool,
    pub indicator: bool,
}

impl SimHardware {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            wheel_a: Duty::STOPPED,
            wheel_b: Duty::STOPPED,
            gate: GateDrive::Stop,
            position: 0,
            stalled: false,
            indicator: false,
        }
    }

    /// Moves the gate arm for the millisecond ending at `now`.
    pub fn advance(&mut self, now: SimInstant) {
        if self.stalled {
            return;
        }
        match self.gate {
            GateDrive::Open { .. } if now.millis() % OPEN_MS_PER_COUNT == 0 => self.position += 1,
            GateDrive::Close { .. } if now.millis() % CLOSE_MS_PER_COUNT == 0 => {
                self.position -= 1;
            }
            _ => {}
        }
    }
}

impl Default for SimHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl GateActuator for SimHardware {
    fn drive_gate(&mut self, drive: GateDrive) {
        self.gate = drive;
    }

    fn reset_position(&mut self) {
        self.position = 0;
    }

    fn position(&mut self) -> i32 {
        self.position
    }
}

impl LauncherOutputs for SimHardware {
    fn set_drive_duty(&mut self, duty: Duty) {
        self.wheel_a = duty;
        self.wheel_b = duty;
    }

    fn set_indicator(&mut self, on: bool) {
        self.indicator = on;
    }
}

/// Keeps the latest frame and buzzer note for the console to print.
#[derive(Clone, Debug, Default)]
pub struct ConsolePresenter {
    pub frame: StatusFrame,
    pub tone: Option<Tone>,
}

impl StatusPresenter for ConsolePresenter {
    fn show(&mut self, view: &StatusView) {
        self.frame = StatusFrame::render(view);
    }

    fn sound(&mut self, tone: Option<Tone>) {
        self.tone = tone;
    }
}
