use core::ops::Add;
use core::time::Duration;

use launcher_core::config::LauncherConfig;
use launcher_core::controller::{
    ArmedPhase, DisarmReason, Inputs, LauncherController, LauncherOutputs,
};
use launcher_core::duty::Duty;
use launcher_core::gate::{GateActuator, GateDrive, GatePhase, GateTransition, PhaseEnd};
use launcher_core::presentation::NoopPresenter;
use launcher_core::time::ControlInstant;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct MockInstant(u64);

impl Add<Duration> for MockInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0 + u64::try_from(rhs.as_millis()).expect("test durations fit"))
    }
}

impl ControlInstant for MockInstant {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

/// Gate motor whose encoder moves one count per millisecond while driven,
/// or stays put when stalled.
#[derive(Default)]
struct ScriptedGate {
    drive: Option<GateDrive>,
    position: i32,
    resets: usize,
    stalled: bool,
    duty: Duty,
}

impl ScriptedGate {
    fn advance(&mut self) {
        if self.stalled {
            return;
        }
        match self.drive {
            Some(GateDrive::Open { .. }) => self.position += 1,
            Some(GateDrive::Close { .. }) => self.position -= 1,
            _ => {}
        }
    }
}

impl GateActuator for ScriptedGate {
    fn drive_gate(&mut self, drive: GateDrive) {
        self.drive = Some(drive);
    }

    fn reset_position(&mut self) {
        self.position = 0;
        self.resets += 1;
    }

    fn position(&mut self) -> i32 {
        self.position
    }
}

impl LauncherOutputs for ScriptedGate {
    fn set_drive_duty(&mut self, duty: Duty) {
        self.duty = duty;
    }

    fn set_indicator(&mut self, _on: bool) {}
}

type Controller = LauncherController<MockInstant, ScriptedGate, NoopPresenter>;

fn controller() -> Controller {
    let mut controller =
        LauncherController::new(LauncherConfig::DEFAULT, ScriptedGate::default(), NoopPresenter);
    controller.start(2_060);
    controller
}

fn run(controller: &mut Controller, from: u64, to: u64) -> Vec<(u64, GateTransition)> {
    let mut ended = Vec::new();
    for t in from..=to {
        controller.outputs_mut().advance();
        let report = controller.tick(
            Inputs {
                pot_raw: 2_060,
                ..Inputs::default()
            },
            MockInstant(t),
        );
        if let Some(transition) = report.gate {
            ended.push((t, transition));
        }
    }
    ended
}

#[test]
fn stalled_encoder_ends_each_motion_at_phase_timeout() {
    let mut controller = controller();
    controller.arm(MockInstant(0));
    let mut ended = run(&mut controller, 1, 10);

    // Jammed ten counts into the opening swing.
    controller.outputs_mut().stalled = true;
    ended.extend(run(&mut controller, 11, 9_000));
    let summary: Vec<_> = ended
        .iter()
        .map(|(t, transition)| (*t, transition.ended, transition.cause))
        .collect();

    assert_eq!(
        summary,
        vec![
            (2_000, GatePhase::Opening, PhaseEnd::TimedOut),
            (7_000, GatePhase::Holding, PhaseEnd::HoldElapsed),
            (9_000, GatePhase::Closing, PhaseEnd::TimedOut),
        ]
    );
    assert_eq!(controller.armed_phase(), Some(ArmedPhase::Spinning));
    assert_eq!(controller.outputs().drive, Some(GateDrive::Stop));
}

#[test]
fn moving_encoder_ends_opening_at_target() {
    let mut controller = controller();
    controller.arm(MockInstant(0));

    let ended = run(&mut controller, 1, 200);
    assert_eq!(ended.len(), 1);
    let (at, transition) = ended[0];
    assert_eq!(at, 103);
    assert_eq!(transition.cause, PhaseEnd::TargetReached);
    assert_eq!(transition.position, 103);
    assert_eq!(controller.armed_phase(), Some(ArmedPhase::GateCycle));
}

#[test]
fn disarm_during_hold_closes_and_rearm_resumes_opening() {
    let mut controller = controller();
    controller.arm(MockInstant(0));
    run(&mut controller, 1, 500);
    assert_eq!(controller.gate_phase(), GatePhase::Holding);

    controller.disarm(DisarmReason::Button, MockInstant(501));
    assert_eq!(controller.gate_phase(), GatePhase::Closing);
    assert_eq!(controller.outputs().duty, Duty::STOPPED);

    run(&mut controller, 502, 541);
    let position = controller.outputs().position;
    assert!(position > 0 && position < 103);

    controller.arm(MockInstant(542));
    assert_eq!(controller.gate_phase(), GatePhase::Opening);
    assert_eq!(controller.outputs().resets, 1);
    assert_eq!(controller.outputs().position, position);
    assert_eq!(controller.outputs().duty, Duty::new(128));
}

#[test]
fn idle_controller_finishes_closing_gate() {
    let mut controller = controller();
    controller.arm(MockInstant(0));
    run(&mut controller, 1, 50);
    controller.disarm(DisarmReason::Button, MockInstant(51));

    let ended = run(&mut controller, 52, 200);
    assert_eq!(ended.len(), 1);
    assert_eq!(ended[0].1.ended, GatePhase::Closing);
    assert_eq!(ended[0].1.cause, PhaseEnd::TargetReached);
    assert_eq!(controller.gate_phase(), GatePhase::Done);
}
