use embassy_futures::select::{Either, select};
use embassy_stm32::exti::ExtiInput;
use embassy_time::{Duration, Ticker};
use launcher_core::controller::Inputs;

use super::FirmwareController;
use crate::hw::board::Potentiometer;
use crate::launcher::{FirmwareInstant, log_report};

const CONTROL_PERIOD: Duration = Duration::from_millis(1);

/// Owns the controller. Wakes on the control tick or on any button edge,
/// whichever comes first; the edge itself is only passed on as a flag.
#[embassy_executor::task]
pub async fn run(
    mut controller: FirmwareController,
    mut button: ExtiInput<'static>,
    mut pot: Potentiometer<'static>,
) -> ! {
    let mut ticker = Ticker::every(CONTROL_PERIOD);

    loop {
        let button_edge = matches!(
            select(ticker.next(), button.wait_for_any_edge()).await,
            Either::Second(())
        );

        let inputs = Inputs {
            button_high: button.is_high(),
            button_edge,
            pot_raw: pot.read(),
        };
        let now = FirmwareInstant::now();
        let report = controller.tick(inputs, now);
        if !report.is_quiet() {
            log_report(&report, now);
        }
    }
}
