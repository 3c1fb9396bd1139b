//! IDLE/ARMED state machine.
//!
//! [`LauncherController`] owns every piece of mutable control state: the
//! button debouncer, the frozen duty, the arm timestamp and the gate
//! sequence. The caller feeds it one [`Inputs`] sample per tick together
//! with the current instant and gets back a [`TickReport`] describing what
//! changed, which the firmware turns into log lines and the emulator into
//! console output.
//!
//! Ordering within one tick is fixed: debounce, press, auto-disarm, gate,
//! presentation.

use core::fmt;
use core::time::Duration;

use crate::config::{ConfigError, LauncherConfig, SpinUpOrder};
use crate::duty::Duty;
use crate::gate::{
    GateActuator, GateDrive, GatePhase, GateSequence, GateSettings, GateTransition,
};
use crate::input::Debouncer;
use crate::presentation::{StatusPresenter, StatusView, chime_tone};
use crate::telemetry::{TelemetryEvent, TelemetryRecorder};
use crate::time::ControlInstant;

/// Outputs commanded by the controller beyond the gate motor.
pub trait LauncherOutputs: GateActuator {
    /// Sets both launch wheel motors to the same forward duty. Reverse
    /// channels stay at zero.
    fn set_drive_duty(&mut self, duty: Duty);

    /// Drives the ARMED indicator LED.
    fn set_indicator(&mut self, on: bool);
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ControlState {
    Idle,
    Armed,
}

impl ControlState {
    pub const fn label(self) -> &'static str {
        match self {
            ControlState::Idle => "IDLE",
            ControlState::Armed => "ARMED",
        }
    }
}

impl fmt::Display for ControlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Progress of an armed session.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ArmedPhase {
    /// The gate is still opening, holding or closing.
    GateCycle,
    /// The gate is back at rest; only the wheels are running.
    Spinning,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DisarmReason {
    Button,
    Timeout,
}

impl DisarmReason {
    pub const fn label(self) -> &'static str {
        match self {
            DisarmReason::Button => "button",
            DisarmReason::Timeout => "timeout",
        }
    }
}

impl fmt::Display for DisarmReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One control-loop sample.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Inputs {
    /// Raw button level, `true` while pressed.
    pub button_high: bool,
    /// An edge interrupt fired since the previous tick.
    pub button_edge: bool,
    /// Raw 12-bit potentiometer reading.
    pub pot_raw: u16,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Transition {
    Armed { duty: Duty },
    Disarmed { reason: DisarmReason },
}

/// What happened during one tick.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TickReport {
    pub transition: Option<Transition>,
    pub gate: Option<GateTransition>,
    pub duty_changed: Option<Duty>,
}

impl TickReport {
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.transition.is_none() && self.gate.is_none() && self.duty_changed.is_none()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ReconfigureError {
    /// Settings can only change while idle.
    Armed,
    Invalid(ConfigError),
}

impl fmt::Display for ReconfigureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconfigureError::Armed => f.write_str("cannot reconfigure while armed"),
            ReconfigureError::Invalid(err) => write!(f, "invalid configuration: {err}"),
        }
    }
}

impl From<ConfigError> for ReconfigureError {
    fn from(err: ConfigError) -> Self {
        ReconfigureError::Invalid(err)
    }
}

/// The launcher control state machine.
pub struct LauncherController<I, O, P>
where
    I: ControlInstant,
{
    config: LauncherConfig,
    state: ControlState,
    armed_phase: ArmedPhase,
    desired_duty: Duty,
    armed_at: Option<I>,
    debouncer: Debouncer<I>,
    gate: GateSequence<I>,
    outputs: O,
    presenter: P,
    telemetry: TelemetryRecorder<I>,
}

impl<I, O, P> LauncherController<I, O, P>
where
    I: ControlInstant,
    O: LauncherOutputs,
    P: StatusPresenter,
{
    /// Builds an idle controller. `config` is expected to have passed
    /// [`LauncherConfig::validate`].
    pub fn new(config: LauncherConfig, outputs: O, presenter: P) -> Self {
        Self {
            config,
            state: ControlState::Idle,
            armed_phase: ArmedPhase::GateCycle,
            desired_duty: Duty::STOPPED,
            armed_at: None,
            debouncer: Debouncer::new(config.debounce),
            gate: GateSequence::new(GateSettings::from_config(&config)),
            outputs,
            presenter,
            telemetry: TelemetryRecorder::new(),
        }
    }

    /// Puts every output in its safe state, captures the initial duty and
    /// shows the first idle frame.
    pub fn start(&mut self, pot_raw: u16) {
        self.outputs.set_drive_duty(Duty::STOPPED);
        self.outputs.drive_gate(GateDrive::Stop);
        self.outputs.set_indicator(false);
        self.presenter.sound(None);
        self.desired_duty = Duty::from_raw(pot_raw);
        self.present_idle();
    }

    /// Runs one control iteration.
    pub fn tick(&mut self, inputs: Inputs, now: I) -> TickReport {
        let mut report = TickReport::default();

        if inputs.button_edge {
            self.debouncer.note_edge(now);
        }
        if self.debouncer.sample(inputs.button_high, now) {
            report.transition = match self.state {
                ControlState::Idle => self.arm(now),
                ControlState::Armed => self.disarm(DisarmReason::Button, now),
            };
        }

        if let Some(armed_at) = self.armed_at
            && now.has_elapsed(armed_at, self.config.armed_timeout)
        {
            report.transition = self.disarm(DisarmReason::Timeout, now);
        }

        report.gate = self.service_gate(now);

        match self.state {
            ControlState::Idle => report.duty_changed = self.track_duty(inputs.pot_raw, now),
            ControlState::Armed => self.present_armed(now),
        }

        report
    }

    /// IDLE to ARMED. Returns `None` when already armed.
    pub fn arm(&mut self, now: I) -> Option<Transition> {
        if self.state == ControlState::Armed {
            return None;
        }

        self.state = ControlState::Armed;
        self.armed_phase = ArmedPhase::GateCycle;
        self.armed_at = Some(now);

        let duty = self.desired_duty;
        if self.config.spin_up == SpinUpOrder::WithGate {
            self.outputs.set_drive_duty(duty);
        }
        self.outputs.set_indicator(true);
        self.gate.start(&mut self.outputs, now);

        self.telemetry.record(TelemetryEvent::Armed { duty }, now);
        self.present_armed(now);
        Some(Transition::Armed { duty })
    }

    /// ARMED to IDLE. Returns `None` (and touches nothing) when already idle.
    pub fn disarm(&mut self, reason: DisarmReason, now: I) -> Option<Transition> {
        if self.state == ControlState::Idle {
            return None;
        }

        self.state = ControlState::Idle;
        self.armed_at = None;
        self.armed_phase = ArmedPhase::GateCycle;

        self.outputs.set_drive_duty(Duty::STOPPED);
        self.outputs.set_indicator(false);
        self.presenter.sound(None);
        self.gate.retract(&mut self.outputs, now);

        self.telemetry.record(TelemetryEvent::Disarmed { reason }, now);
        self.present_idle();
        Some(Transition::Disarmed { reason })
    }

    /// Swaps in new settings. Only allowed while idle.
    pub fn reconfigure(&mut self, config: LauncherConfig) -> Result<(), ReconfigureError> {
        if self.state == ControlState::Armed {
            return Err(ReconfigureError::Armed);
        }
        config.validate()?;

        self.config = config;
        self.debouncer.set_interval(config.debounce);
        self.gate.set_settings(GateSettings::from_config(&config));
        self.present_idle();
        Ok(())
    }

    #[must_use]
    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> ControlState {
        self.state
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.state == ControlState::Armed
    }

    /// Armed-session phase, `None` while idle.
    #[must_use]
    pub fn armed_phase(&self) -> Option<ArmedPhase> {
        self.is_armed().then_some(self.armed_phase)
    }

    #[must_use]
    pub fn desired_duty(&self) -> Duty {
        self.desired_duty
    }

    #[must_use]
    pub fn armed_at(&self) -> Option<I> {
        self.armed_at
    }

    /// Time since arming, `None` while idle.
    #[must_use]
    pub fn armed_elapsed(&self, now: I) -> Option<Duration> {
        self.armed_at
            .map(|armed_at| now.saturating_duration_since(armed_at))
    }

    /// Time left before auto-disarm, `None` while idle.
    #[must_use]
    pub fn armed_remaining(&self, now: I) -> Option<Duration> {
        self.armed_elapsed(now)
            .map(|elapsed| self.config.armed_timeout.saturating_sub(elapsed))
    }

    #[must_use]
    pub fn gate_phase(&self) -> GatePhase {
        self.gate.phase()
    }

    #[must_use]
    pub fn outputs(&self) -> &O {
        &self.outputs
    }

    pub fn outputs_mut(&mut self) -> &mut O {
        &mut self.outputs
    }

    #[must_use]
    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    #[must_use]
    pub fn telemetry(&self) -> &TelemetryRecorder<I> {
        &self.telemetry
    }

    /// The view matching the current state.
    #[must_use]
    pub fn view(&self, now: I) -> StatusView {
        match self.state {
            ControlState::Idle => StatusView::idle(self.desired_duty, self.config.max_rpm),
            ControlState::Armed => self.armed_view(now),
        }
    }

    fn service_gate(&mut self, now: I) -> Option<GateTransition> {
        let ended = self.gate.poll(&mut self.outputs, now);
        if let Some(transition) = ended {
            self.telemetry.record(transition.into(), now);
        }

        if self.state == ControlState::Armed
            && self.armed_phase == ArmedPhase::GateCycle
            && !self.gate.is_active()
        {
            self.armed_phase = ArmedPhase::Spinning;
            if self.config.spin_up == SpinUpOrder::AfterGate {
                self.outputs.set_drive_duty(self.desired_duty);
            }
        }

        ended
    }

    fn track_duty(&mut self, pot_raw: u16, now: I) -> Option<Duty> {
        let duty = Duty::from_raw(pot_raw);
        if duty == self.desired_duty {
            return None;
        }
        self.desired_duty = duty;
        self.telemetry.record(TelemetryEvent::DutyChanged { duty }, now);
        self.present_idle();
        Some(duty)
    }

    fn armed_view(&self, now: I) -> StatusView {
        StatusView::Armed {
            duty: self.desired_duty,
            elapsed: self.armed_elapsed(now).unwrap_or(Duration::ZERO),
            phase: self.armed_phase,
            gate: self.gate.phase(),
        }
    }

    fn present_idle(&mut self) {
        let view = StatusView::idle(self.desired_duty, self.config.max_rpm);
        self.presenter.show(&view);
    }

    fn present_armed(&mut self, now: I) {
        let view = self.armed_view(now);
        self.presenter.show(&view);
        if self.config.chime {
            let elapsed = self.armed_elapsed(now).unwrap_or(Duration::ZERO);
            self.presenter.sound(chime_tone(elapsed));
        }
    }
}
