use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use launcher_core::config::{ALL_CONFIG_KEYS, ConfigKey, LauncherConfig, LauncherProfile};
use launcher_core::console::{self, ConsoleCommand, EncoderMode, catalog};
use launcher_core::controller::{
    ArmedPhase, ControlState, Inputs, LauncherController, ReconfigureError, TickReport,
    Transition,
};
use launcher_core::duty::{Duty, rpm_for};
use launcher_core::presentation::{BAR_GLYPH, StatusFrame};
use launcher_core::telemetry::TelemetryEvent;

use crate::sim::{ConsolePresenter, SimHardware, SimInstant};

const DEFAULT_TAP: Duration = Duration::from_millis(100);
const DEFAULT_BOUNCE: Duration = Duration::from_millis(20);
/// Half-period of the simulated contact chatter.
const BOUNCE_TOGGLE_MS: u64 = 3;
/// Block used to show the speed bar on a terminal.
const BAR_CELL: char = '█';

pub type Controller = LauncherController<SimInstant, SimHardware, ConsolePresenter>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LineKind {
    Info,
    /// Something the controller did: a transition, a gate phase end, a duty change.
    Event,
    /// One row of the character display.
    Display,
    Error,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Line {
    pub kind: LineKind,
    pub text: String,
}

impl Line {
    fn info(text: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Info,
            text: text.into(),
        }
    }

    fn event(at: SimInstant, text: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Event,
            text: format!("[+{}ms] {}", at.millis(), text.into()),
        }
    }

    /// A display row, as printed after each command.
    pub fn row(text: String) -> Self {
        Self {
            kind: LineKind::Display,
            text,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Error,
            text: text.into(),
        }
    }
}

/// Output of one console line.
#[derive(Debug, Default)]
pub struct Reply {
    pub lines: Vec<Line>,
    pub exit: bool,
}

/// A launcher running against simulated hardware and a millisecond clock
/// that only moves when a command moves it.
pub struct Session {
    controller: Controller,
    profile: LauncherProfile,
    now: SimInstant,
    button: bool,
    pot: u16,
    transcript: Option<TranscriptLogger>,
}

impl Session {
    pub fn new(profile: LauncherProfile, transcript: Option<&Path>) -> io::Result<Self> {
        let transcript = transcript
            .map(|path| TranscriptLogger::new(path, profile))
            .transpose()?;
        let mut controller = LauncherController::new(
            profile.config(),
            SimHardware::new(),
            ConsolePresenter::default(),
        );
        let pot = 0;
        controller.start(pot);

        Ok(Self {
            controller,
            profile,
            now: SimInstant(0),
            button: false,
            pot,
            transcript,
        })
    }

    #[must_use]
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    #[must_use]
    pub fn now(&self) -> SimInstant {
        self.now
    }

    /// The current display rows as they would read on the LCD.
    #[must_use]
    pub fn display_lines(&self) -> [String; 2] {
        let frame: &StatusFrame = &self.controller.presenter().frame;
        [frame_row(&frame.top), frame_row(&frame.bottom)]
    }

    pub fn handle_command(&mut self, line: &str) -> io::Result<Reply> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Reply::default());
        }
        self.record(TranscriptRole::Host, trimmed)?;

        let mut reply = Reply::default();
        match console::parse(trimmed) {
            Ok(command) => reply.exit = self.execute(command, &mut reply.lines),
            Err(err) => reply.lines.push(Line::error(format!("ERR {err}"))),
        }
        if !reply.exit {
            reply
                .lines
                .extend(self.display_lines().into_iter().map(Line::row));
        }

        for line in &reply.lines {
            self.record(TranscriptRole::Emulator, &line.text)?;
        }
        Ok(reply)
    }

    /// Runs one command; returns `true` when the session should end.
    fn execute(&mut self, command: ConsoleCommand<'_>, lines: &mut Vec<Line>) -> bool {
        match command {
            ConsoleCommand::Press => self.set_button(true, lines),
            ConsoleCommand::Release => self.set_button(false, lines),
            ConsoleCommand::Tap(hold) => {
                let hold = hold.unwrap_or(DEFAULT_TAP);
                self.set_button(true, lines);
                self.run_for(hold.saturating_sub(Duration::from_millis(1)), lines);
                self.set_button(false, lines);
            }
            ConsoleCommand::Bounce(span) => {
                let span = span.unwrap_or(DEFAULT_BOUNCE);
                for ms in 0..duration_millis(span) {
                    self.set_button((ms / BOUNCE_TOGGLE_MS) % 2 == 0, lines);
                }
                self.set_button(false, lines);
            }
            ConsoleCommand::Pot(raw) => {
                self.pot = raw;
                self.step(false, lines);
            }
            ConsoleCommand::Advance(span) => self.run_for(span, lines),
            ConsoleCommand::Encoder(mode) => {
                let stalled = mode == EncoderMode::Stall;
                self.controller.outputs_mut().stalled = stalled;
                lines.push(Line::info(if stalled {
                    "encoder stalled"
                } else {
                    "encoder running"
                }));
            }
            ConsoleCommand::Set { key, value } => {
                let result = self
                    .controller
                    .config()
                    .with_option(key, value)
                    .map_err(ReconfigureError::from)
                    .and_then(|config| self.controller.reconfigure(config));
                match result {
                    Ok(()) => lines.push(Line::info(format!(
                        "{key} = {}",
                        self.controller.config().option(key)
                    ))),
                    Err(err) => lines.push(Line::error(format!("ERR {err}"))),
                }
            }
            ConsoleCommand::Config => self.describe_config(lines),
            ConsoleCommand::Status => self.describe_status(lines),
            ConsoleCommand::Log => self.describe_log(lines),
            ConsoleCommand::Help(topic) => describe_help(topic, self.controller.config(), lines),
            ConsoleCommand::Exit => {
                lines.push(Line::info("Session closed."));
                return true;
            }
        }
        false
    }

    fn set_button(&mut self, level: bool, lines: &mut Vec<Line>) {
        let edge = level != self.button;
        self.button = level;
        self.step(edge, lines);
    }

    fn run_for(&mut self, span: Duration, lines: &mut Vec<Line>) {
        for _ in 0..duration_millis(span) {
            self.step(false, lines);
        }
    }

    /// Advances the clock by one millisecond and runs one control tick.
    fn step(&mut self, edge: bool, lines: &mut Vec<Line>) {
        self.now = self.now + Duration::from_millis(1);
        self.controller.outputs_mut().advance(self.now);
        let inputs = Inputs {
            button_high: self.button,
            button_edge: edge,
            pot_raw: self.pot,
        };
        let report = self.controller.tick(inputs, self.now);
        self.describe_report(&report, lines);
    }

    fn describe_report(&self, report: &TickReport, lines: &mut Vec<Line>) {
        let max_rpm = self.controller.config().max_rpm;
        match report.transition {
            Some(Transition::Armed { duty }) => lines.push(Line::event(
                self.now,
                format!("ARMED {}", describe_duty(duty, max_rpm)),
            )),
            Some(Transition::Disarmed { reason }) => {
                lines.push(Line::event(self.now, format!("IDLE ({reason})")));
            }
            None => {}
        }
        if let Some(transition) = report.gate {
            lines.push(Line::event(
                self.now,
                TelemetryEvent::from(transition).to_string(),
            ));
        }
        if let Some(duty) = report.duty_changed {
            lines.push(Line::event(self.now, describe_duty(duty, max_rpm)));
        }
    }

    fn describe_config(&self, lines: &mut Vec<Line>) {
        let config = self.controller.config();
        lines.push(Line::info(format!("profile {}", self.profile.label())));
        for key in ALL_CONFIG_KEYS {
            lines.push(Line::info(format!(
                "  {:<22} {}",
                key.name(),
                config.option(key)
            )));
        }
    }

    fn describe_status(&self, lines: &mut Vec<Line>) {
        let controller = &self.controller;
        let config = controller.config();
        let hardware = controller.outputs();

        let state = match controller.armed_phase() {
            Some(phase) => {
                let elapsed = controller.armed_elapsed(self.now).unwrap_or(Duration::ZERO);
                let remaining = controller
                    .armed_remaining(self.now)
                    .unwrap_or(Duration::ZERO);
                let phase = match phase {
                    ArmedPhase::GateCycle => "gate cycle",
                    ArmedPhase::Spinning => "spinning",
                };
                format!(
                    "state {} ({phase}) for {}, auto-disarm in {}",
                    ControlState::Armed,
                    format_duration_short(elapsed),
                    format_duration_short(remaining)
                )
            }
            None => format!("state {}", ControlState::Idle),
        };
        lines.push(Line::info(state));
        lines.push(Line::info(format!(
            "duty {} wheels {}/{}",
            describe_duty(controller.desired_duty(), config.max_rpm),
            hardware.wheel_a.get(),
            hardware.wheel_b.get()
        )));
        lines.push(Line::info(format!(
            "gate {} position {} encoder {}",
            controller.gate_phase(),
            hardware.position,
            if hardware.stalled { "stalled" } else { "running" }
        )));
        let buzzer = controller
            .presenter()
            .tone
            .map_or_else(|| "off".to_string(), |tone| format!("{} Hz", tone.frequency_hz));
        lines.push(Line::info(format!(
            "indicator {} buzzer {buzzer} pot {}",
            if hardware.indicator { "on" } else { "off" },
            self.pot
        )));
        lines.push(Line::info(format!("time +{}ms", self.now.millis())));
    }

    fn describe_log(&self, lines: &mut Vec<Line>) {
        let telemetry = self.controller.telemetry();
        if telemetry.is_empty() {
            lines.push(Line::info("no events recorded"));
            return;
        }
        for record in telemetry.oldest_first() {
            lines.push(Line::info(format!(
                "[+{}ms] #{} {}",
                record.timestamp.millis(),
                record.id,
                record.event
            )));
        }
    }

    fn record(&mut self, role: TranscriptRole, line: &str) -> io::Result<()> {
        match self.transcript.as_mut() {
            Some(transcript) => transcript.append_line(self.now, role, line),
            None => Ok(()),
        }
    }
}

fn describe_help(
    topic: Option<&str>,
    config: &LauncherConfig,
    lines: &mut Vec<Line>,
) {
    match topic {
        Some(topic) => {
            if let Some(spec) = catalog::find(topic) {
                lines.push(Line::info(format!("{:<24} {}", spec.usage, spec.summary)));
                if !spec.aliases.is_empty() {
                    lines.push(Line::info(format!("aliases: {}", spec.aliases.join(", "))));
                }
            } else if let Some(key) = ConfigKey::from_name(topic) {
                lines.push(Line::info(format!(
                    "{key}: {} (now {})",
                    key.summary(),
                    config.option(key)
                )));
            } else {
                lines.push(Line::error(format!("No help available for `{topic}`.")));
            }
        }
        None => {
            lines.push(Line::info("Available commands:"));
            for spec in catalog::commands() {
                lines.push(Line::info(format!("  {:<24} {}", spec.usage, spec.summary)));
            }
            let options: Vec<&str> = ALL_CONFIG_KEYS.iter().map(|key| key.name()).collect();
            lines.push(Line::info(format!("Options: {}", options.join(", "))));
            lines.push(Line::info(
                "Durations are <n>ms or <n>s. Type `help <command|option>` for details.",
            ));
        }
    }
}

fn describe_duty(duty: Duty, max_rpm: u16) -> String {
    format!("duty={} ({} rpm)", duty.get(), rpm_for(duty, max_rpm))
}

fn frame_row(row: &str) -> String {
    row.chars()
        .map(|ch| if ch == BAR_GLYPH { BAR_CELL } else { ch })
        .collect()
}

fn duration_millis(span: Duration) -> u64 {
    u64::try_from(span.as_millis()).unwrap_or(u64::MAX)
}

fn format_duration_short(duration: Duration) -> String {
    if duration.as_secs() == 0 {
        format!("{}ms", duration.as_millis())
    } else {
        format!("{:.3}s", duration.as_secs_f64())
    }
}

struct TranscriptLogger {
    writer: BufWriter<std::fs::File>,
}

impl TranscriptLogger {
    fn new(path: &Path, profile: LauncherProfile) -> io::Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut logger = Self {
            writer: BufWriter::new(file),
        };
        logger.write_header(profile)?;
        Ok(logger)
    }

    fn write_header(&mut self, profile: LauncherProfile) -> io::Result<()> {
        writeln!(
            self.writer,
            "# Ball launcher emulator transcript ({} profile)",
            profile.label()
        )?;
        writeln!(self.writer, "# Timestamps are simulated milliseconds")?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn append_line(&mut self, at: SimInstant, role: TranscriptRole, line: &str) -> io::Result<()> {
        writeln!(self.writer, "[+{:>6} ms] {} {}", at.millis(), role.prefix(), line)?;
        self.writer.flush()
    }
}

enum TranscriptRole {
    Host,
    Emulator,
}

impl TranscriptRole {
    fn prefix(&self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Emulator => "EMU <",
        }
    }
}
