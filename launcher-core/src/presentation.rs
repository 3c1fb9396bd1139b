//! Status views, 16x2 text frames and the arming chime.
//!
//! The controller describes what should be shown as a [`StatusView`]; a
//! [`StatusPresenter`] decides how. Both the firmware LCD and the emulator
//! console render the same [`StatusFrame`] text.

use core::fmt::Write as _;
use core::time::Duration;

use heapless::String;

use crate::controller::ArmedPhase;
use crate::duty::{Duty, bar_cells, rpm_for};
use crate::gate::GatePhase;

/// Characters per display row.
pub const DISPLAY_COLUMNS: usize = 16;

/// CGRAM slot 0 holds a solid 5x8 block used for the speed bar.
pub const BAR_GLYPH: char = '\u{0}';

/// Bitmap loaded into CGRAM slot 0.
pub const FULL_BLOCK: [u8; 8] = [0x1F; 8];

/// Spinner frames, advanced every [`SPINNER_PERIOD`].
pub const SPINNER_FRAMES: [char; 4] = ['|', '/', '-', '\\'];
pub const SPINNER_PERIOD: Duration = Duration::from_millis(300);

pub type DisplayLine = String<DISPLAY_COLUMNS>;

/// What the operator should currently see.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StatusView {
    Idle {
        duty: Duty,
        rpm: u16,
        bar: usize,
    },
    Armed {
        duty: Duty,
        elapsed: Duration,
        phase: ArmedPhase,
        gate: GatePhase,
    },
}

impl StatusView {
    /// Idle view for `duty`, with the RPM estimate and bar derived from
    /// `max_rpm`.
    #[must_use]
    pub fn idle(duty: Duty, max_rpm: u16) -> Self {
        let rpm = rpm_for(duty, max_rpm);
        StatusView::Idle {
            duty,
            rpm,
            bar: bar_cells(rpm, max_rpm, DISPLAY_COLUMNS),
        }
    }

    #[must_use]
    pub const fn is_armed(&self) -> bool {
        matches!(self, StatusView::Armed { .. })
    }
}

/// Two rows of display text.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StatusFrame {
    pub top: DisplayLine,
    pub bottom: DisplayLine,
}

impl StatusFrame {
    /// Renders a view into display text.
    #[must_use]
    pub fn render(view: &StatusView) -> Self {
        let mut frame = StatusFrame::default();
        match *view {
            StatusView::Idle { rpm, bar, .. } => {
                let _ = write!(frame.top, "IDLE RPM:{rpm:>5}");
                for cell in 0..DISPLAY_COLUMNS {
                    let glyph = if cell < bar { BAR_GLYPH } else { ' ' };
                    let _ = frame.bottom.push(glyph);
                }
            }
            StatusView::Armed {
                elapsed,
                phase,
                gate,
                ..
            } => {
                let _ = frame.top.push_str("Woofie launching");
                let spinner = spinner_frame(elapsed);
                match phase {
                    ArmedPhase::GateCycle => {
                        let _ = write!(frame.bottom, "gate {:<8}{spinner}", gate.label());
                    }
                    ArmedPhase::Spinning => {
                        let _ = write!(frame.bottom, "in progress {spinner}");
                    }
                }
            }
        }
        frame.pad();
        frame
    }

    fn pad(&mut self) {
        for line in [&mut self.top, &mut self.bottom] {
            while line.len() < DISPLAY_COLUMNS {
                if line.push(' ').is_err() {
                    break;
                }
            }
        }
    }
}

/// Spinner character for the time spent armed.
#[must_use]
pub fn spinner_frame(elapsed: Duration) -> char {
    let step = elapsed.as_millis() / SPINNER_PERIOD.as_millis();
    let index = usize::try_from(step % 4).unwrap_or(0);
    SPINNER_FRAMES[index]
}

/// A buzzer note.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Tone {
    pub frequency_hz: u16,
}

/// One step of the arming chime: a note (or a rest) held until `until`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct ChimeStep {
    until: Duration,
    note: Option<u16>,
}

const fn step(until_ms: u64, note: Option<u16>) -> ChimeStep {
    ChimeStep {
        until: Duration::from_millis(until_ms),
        note,
    }
}

// Two short yaps, the second lower.
const ARMING_CHIME: [ChimeStep; 5] = [
    step(90, Some(1_245)),
    step(140, Some(932)),
    step(260, None),
    step(340, Some(1_047)),
    step(420, Some(784)),
];

/// Note the arming chime plays `elapsed` after arming, or `None` once it is
/// over (and during rests).
#[must_use]
pub fn chime_tone(elapsed: Duration) -> Option<Tone> {
    ARMING_CHIME
        .iter()
        .find(|step| elapsed < step.until)
        .and_then(|step| step.note)
        .map(|frequency_hz| Tone { frequency_hz })
}

/// Total length of the arming chime.
#[must_use]
pub fn chime_length() -> Duration {
    ARMING_CHIME
        .last()
        .map_or(Duration::ZERO, |step| step.until)
}

/// Sink for status output.
///
/// Called from the control loop, so implementations must not block: the
/// firmware hands frames to a display task, the emulator buffers them.
pub trait StatusPresenter {
    fn show(&mut self, view: &StatusView);

    /// Starts a tone, or silences the buzzer with `None`.
    fn sound(&mut self, tone: Option<Tone>);
}

/// Presenter that discards everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopPresenter;

impl StatusPresenter for NoopPresenter {
    fn show(&mut self, _view: &StatusView) {}

    fn sound(&mut self, _tone: Option<Tone>) {}
}
