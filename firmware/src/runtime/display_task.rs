use embassy_futures::select::{Either, Either3, select, select3};
use embassy_stm32::i2c::I2c;
use embassy_stm32::mode::Async;
use embassy_time::{Delay, Duration, Timer};

use crate::hw::board::Buzzer;
use crate::hw::lcd::{CharacterLcd, FrameRefresher};
use crate::launcher::{FrameSignal, ToneSignal};

pub type BoardLcd = CharacterLcd<I2c<'static, Async>, Delay>;

/// Pause before retrying a frame the display refused.
const DISPLAY_RETRY: Duration = Duration::from_millis(100);

/// Drains the frame and tone signals. A frame that fails to write stays
/// queued and is retried until it lands or a newer frame replaces it.
#[embassy_executor::task]
pub async fn run(
    lcd: BoardLcd,
    mut buzzer: Buzzer<'static>,
    frames: &'static FrameSignal,
    tones: &'static ToneSignal,
) -> ! {
    let mut display = FrameRefresher::new(lcd);

    loop {
        if display.has_pending() {
            match select3(frames.wait(), tones.wait(), Timer::after(DISPLAY_RETRY)).await {
                Either3::First(frame) => display.queue(frame),
                Either3::Second(tone) => buzzer.play(tone),
                Either3::Third(()) => {}
            }
        } else {
            match select(frames.wait(), tones.wait()).await {
                Either::First(frame) => display.queue(frame),
                Either::Second(tone) => buzzer.play(tone),
            }
        }

        if display.has_pending() && display.flush().await.is_err() {
            defmt::warn!("display: write failed, retrying");
        }
    }
}
