//! Gate actuator sequence.
//!
//! Arming swings the feed gate open by roughly a quarter turn, keeps it open
//! for a while so the ball can drop, then swings it back. Each motion ends
//! when the quadrature count crosses its target or when the phase timeout
//! fires, whichever comes first. A stalled or unplugged encoder therefore
//! only delays the cycle, it never wedges it.
//!
//! The sequence is polled once per control tick and never blocks.

use core::fmt;
use core::time::Duration;

use crate::config::LauncherConfig;
use crate::time::ControlInstant;

/// Direction and speed for the gate motor.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GateDrive {
    Stop,
    Open { speed: u8 },
    Close { speed: u8 },
}

/// Hardware behind the gate: an H-bridge channel plus a quadrature counter.
pub trait GateActuator {
    /// Applies the requested drive. Fire-and-forget.
    fn drive_gate(&mut self, drive: GateDrive);

    /// Zeroes the position counter.
    fn reset_position(&mut self);

    /// Current signed position in encoder counts since the last reset.
    fn position(&mut self) -> i32;
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GatePhase {
    Opening,
    Holding,
    Closing,
    Done,
}

impl GatePhase {
    pub const fn label(self) -> &'static str {
        match self {
            GatePhase::Opening => "opening",
            GatePhase::Holding => "holding",
            GatePhase::Closing => "closing",
            GatePhase::Done => "done",
        }
    }
}

impl fmt::Display for GatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a phase ended.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PhaseEnd {
    TargetReached,
    TimedOut,
    HoldElapsed,
}

impl PhaseEnd {
    pub const fn label(self) -> &'static str {
        match self {
            PhaseEnd::TargetReached => "target reached",
            PhaseEnd::TimedOut => "timed out",
            PhaseEnd::HoldElapsed => "hold elapsed",
        }
    }
}

impl fmt::Display for PhaseEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A finished phase, reported by [`GateSequence::poll`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct GateTransition {
    pub ended: GatePhase,
    pub cause: PhaseEnd,
    pub position: i32,
}

/// Timing and speed parameters for one gate cycle.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct GateSettings {
    pub target_counts: i32,
    pub phase_timeout: Duration,
    pub hold: Duration,
    pub open_speed: u8,
    pub close_speed: u8,
}

impl GateSettings {
    #[must_use]
    pub const fn from_config(config: &LauncherConfig) -> Self {
        Self {
            target_counts: config.gate_target_counts,
            phase_timeout: config.gate_phase_timeout,
            hold: config.gate_hold,
            open_speed: config.gate_open_speed,
            close_speed: config.gate_close_speed,
        }
    }
}

/// Non-blocking open, hold, close state machine.
#[derive(Clone, Debug)]
pub struct GateSequence<I> {
    settings: GateSettings,
    phase: GatePhase,
    phase_started: Option<I>,
}

impl<I> GateSequence<I>
where
    I: ControlInstant,
{
    #[must_use]
    pub const fn new(settings: GateSettings) -> Self {
        Self {
            settings,
            phase: GatePhase::Done,
            phase_started: None,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &GateSettings {
        &self.settings
    }

    /// Replaces the cycle parameters. Takes effect from the next phase.
    pub fn set_settings(&mut self, settings: GateSettings) {
        self.settings = settings;
    }

    #[must_use]
    pub const fn phase(&self) -> GatePhase {
        self.phase
    }

    /// Returns `true` until the gate is back at rest.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase != GatePhase::Done
    }

    /// Time spent in the current phase.
    #[must_use]
    pub fn phase_elapsed(&self, now: I) -> Duration {
        self.phase_started
            .map_or(Duration::ZERO, |started| now.saturating_duration_since(started))
    }

    /// Begins opening the gate.
    ///
    /// From rest the position counter is zeroed first. A gate that is still
    /// closing turns around without a reset so the count keeps tracking the
    /// real position. A gate that is already open or opening is left alone.
    pub fn start<A: GateActuator>(&mut self, actuator: &mut A, now: I) {
        match self.phase {
            GatePhase::Done => {
                actuator.reset_position();
                self.enter_opening(actuator, now);
            }
            GatePhase::Closing => self.enter_opening(actuator, now),
            GatePhase::Opening | GatePhase::Holding => {}
        }
    }

    /// Sends an open or opening gate straight to the closing phase.
    ///
    /// Returns `true` when the phase changed.
    pub fn retract<A: GateActuator>(&mut self, actuator: &mut A, now: I) -> bool {
        match self.phase {
            GatePhase::Opening | GatePhase::Holding => {
                self.enter_closing(actuator, now);
                true
            }
            GatePhase::Closing | GatePhase::Done => false,
        }
    }

    /// Advances the sequence. Returns the phase that just ended, if any.
    pub fn poll<A: GateActuator>(&mut self, actuator: &mut A, now: I) -> Option<GateTransition> {
        let started = self.phase_started?;
        match self.phase {
            GatePhase::Opening => {
                let position = actuator.position();
                let reached = position >= self.settings.target_counts;
                let cause = self.motion_end(reached, started, now)?;
                actuator.drive_gate(GateDrive::Stop);
                self.phase = GatePhase::Holding;
                self.phase_started = Some(now);
                Some(GateTransition {
                    ended: GatePhase::Opening,
                    cause,
                    position,
                })
            }
            GatePhase::Holding => {
                if !now.has_elapsed(started, self.settings.hold) {
                    return None;
                }
                let position = actuator.position();
                self.enter_closing(actuator, now);
                Some(GateTransition {
                    ended: GatePhase::Holding,
                    cause: PhaseEnd::HoldElapsed,
                    position,
                })
            }
            GatePhase::Closing => {
                let position = actuator.position();
                let cause = self.motion_end(position <= 0, started, now)?;
                actuator.drive_gate(GateDrive::Stop);
                self.phase = GatePhase::Done;
                self.phase_started = None;
                Some(GateTransition {
                    ended: GatePhase::Closing,
                    cause,
                    position,
                })
            }
            GatePhase::Done => None,
        }
    }

    fn motion_end(&self, reached: bool, started: I, now: I) -> Option<PhaseEnd> {
        if reached {
            Some(PhaseEnd::TargetReached)
        } else if now.has_elapsed(started, self.settings.phase_timeout) {
            Some(PhaseEnd::TimedOut)
        } else {
            None
        }
    }

    fn enter_opening<A: GateActuator>(&mut self, actuator: &mut A, now: I) {
        actuator.drive_gate(GateDrive::Open {
            speed: self.settings.open_speed,
        });
        self.phase = GatePhase::Opening;
        self.phase_started = Some(now);
    }

    fn enter_closing<A: GateActuator>(&mut self, actuator: &mut A, now: I) {
        actuator.drive_gate(GateDrive::Close {
            speed: self.settings.close_speed,
        });
        self.phase = GatePhase::Closing;
        self.phase_started = Some(now);
    }
}
