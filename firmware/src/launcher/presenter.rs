//! Presenter that hands frames to the display task.

use launcher_core::presentation::{StatusFrame, StatusPresenter, StatusView, Tone};

use super::{FrameSignal, ToneSignal};

/// Renders views into frames and signals only the ones that differ from
/// what was last sent, so the display task wakes at most once per visible
/// change (every spinner step while armed).
pub struct SignalPresenter<'a> {
    frames: &'a FrameSignal,
    tones: &'a ToneSignal,
    last_frame: Option<StatusFrame>,
    last_tone: Option<Tone>,
}

impl<'a> SignalPresenter<'a> {
    pub const fn new(frames: &'a FrameSignal, tones: &'a ToneSignal) -> Self {
        Self {
            frames,
            tones,
            last_frame: None,
            last_tone: None,
        }
    }
}

impl StatusPresenter for SignalPresenter<'_> {
    fn show(&mut self, view: &StatusView) {
        let frame = StatusFrame::render(view);
        if self.last_frame.as_ref() == Some(&frame) {
            return;
        }
        self.frames.signal(frame.clone());
        self.last_frame = Some(frame);
    }

    fn sound(&mut self, tone: Option<Tone>) {
        if tone == self.last_tone {
            return;
        }
        self.tones.signal(tone);
        self.last_tone = tone;
    }
}
