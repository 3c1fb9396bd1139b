//! Motor, gate and indicator outputs behind the controller traits.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use launcher_core::controller::LauncherOutputs;
use launcher_core::duty::{DUTY_MAX, Duty};
use launcher_core::gate::{GateActuator, GateDrive};

use super::encoder::{CountSource, QuadratureCounter};

/// A DC motor on a forward/reverse PWM pair. At most one side is driven.
pub struct HBridge<P> {
    forward: P,
    reverse: P,
}

impl<P: SetDutyCycle> HBridge<P> {
    /// Takes both channels and leaves the motor stopped.
    pub fn new(forward: P, reverse: P) -> Self {
        let mut bridge = Self { forward, reverse };
        bridge.stop();
        bridge
    }

    /// Drives forward at `level` out of 255.
    pub fn forward(&mut self, level: u8) {
        apply(&mut self.reverse, 0);
        apply(&mut self.forward, level);
    }

    pub fn reverse(&mut self, level: u8) {
        apply(&mut self.forward, 0);
        apply(&mut self.reverse, level);
    }

    pub fn stop(&mut self) {
        apply(&mut self.forward, 0);
        apply(&mut self.reverse, 0);
    }
}

// PWM writes are fire-and-forget; on the STM32 the channel error type is
// uninhabited.
fn apply<P: SetDutyCycle>(channel: &mut P, level: u8) {
    let _ = channel.set_duty_cycle_fraction(u16::from(level), u16::from(DUTY_MAX));
}

/// Everything the controller drives: two launch wheels, the gate motor and
/// its encoder, and the ARMED indicator.
pub struct LauncherHardware<D, G, L, C> {
    wheel_a: HBridge<D>,
    wheel_b: HBridge<D>,
    gate: HBridge<G>,
    indicator: L,
    encoder: QuadratureCounter<C>,
}

impl<D, G, L, C> LauncherHardware<D, G, L, C>
where
    D: SetDutyCycle,
    G: SetDutyCycle,
    L: OutputPin,
    C: CountSource,
{
    pub fn new(
        wheel_a: HBridge<D>,
        wheel_b: HBridge<D>,
        gate: HBridge<G>,
        indicator: L,
        encoder: QuadratureCounter<C>,
    ) -> Self {
        Self {
            wheel_a,
            wheel_b,
            gate,
            indicator,
            encoder,
        }
    }
}

impl<D, G, L, C> GateActuator for LauncherHardware<D, G, L, C>
where
    D: SetDutyCycle,
    G: SetDutyCycle,
    L: OutputPin,
    C: CountSource,
{
    fn drive_gate(&mut self, drive: GateDrive) {
        match drive {
            GateDrive::Stop => self.gate.stop(),
            GateDrive::Open { speed } => self.gate.forward(speed),
            GateDrive::Close { speed } => self.gate.reverse(speed),
        }
    }

    fn reset_position(&mut self) {
        self.encoder.zero();
    }

    fn position(&mut self) -> i32 {
        self.encoder.position()
    }
}

impl<D, G, L, C> LauncherOutputs for LauncherHardware<D, G, L, C>
where
    D: SetDutyCycle,
    G: SetDutyCycle,
    L: OutputPin,
    C: CountSource,
{
    fn set_drive_duty(&mut self, duty: Duty) {
        self.wheel_a.forward(duty.get());
        self.wheel_b.forward(duty.get());
    }

    fn set_indicator(&mut self, on: bool) {
        let _ = if on {
            self.indicator.set_high()
        } else {
            self.indicator.set_low()
        };
    }
}

#[cfg(test)]
mod tests {
    use core::convert::Infallible;

    use super::*;

    const MAX_DUTY: u16 = 1_000;

    #[derive(Default)]
    struct Channel {
        duty: u16,
    }

    impl embedded_hal::pwm::ErrorType for Channel {
        type Error = Infallible;
    }

    impl SetDutyCycle for Channel {
        fn max_duty_cycle(&self) -> u16 {
            MAX_DUTY
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
            self.duty = duty;
            Ok(())
        }
    }

    #[derive(Default)]
    struct Led {
        lit: bool,
    }

    impl embedded_hal::digital::ErrorType for Led {
        type Error = Infallible;
    }

    impl OutputPin for Led {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.lit = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.lit = true;
            Ok(())
        }
    }

    struct Counter(u16);

    impl CountSource for Counter {
        fn raw_count(&mut self) -> u16 {
            self.0
        }
    }

    type Hardware = LauncherHardware<Channel, Channel, Led, Counter>;

    fn bridge() -> HBridge<Channel> {
        HBridge::new(Channel { duty: 77 }, Channel { duty: 77 })
    }

    fn hardware() -> Hardware {
        LauncherHardware::new(
            bridge(),
            bridge(),
            bridge(),
            Led::default(),
            QuadratureCounter::new(Counter(500)),
        )
    }

    #[test]
    fn new_bridge_is_stopped() {
        let bridge = bridge();
        assert_eq!((bridge.forward.duty, bridge.reverse.duty), (0, 0));
    }

    #[test]
    fn wheels_run_forward_with_reverse_held_low() {
        let mut hardware = hardware();
        hardware.set_drive_duty(Duty::FULL);
        assert_eq!(hardware.wheel_a.forward.duty, MAX_DUTY);
        assert_eq!(hardware.wheel_b.forward.duty, MAX_DUTY);
        assert_eq!(hardware.wheel_a.reverse.duty, 0);
        assert_eq!(hardware.wheel_b.reverse.duty, 0);

        hardware.set_drive_duty(Duty::STOPPED);
        assert_eq!(hardware.wheel_a.forward.duty, 0);
    }

    #[test]
    fn gate_direction_switches_sides() {
        let mut hardware = hardware();
        hardware.drive_gate(GateDrive::Open { speed: 51 });
        assert_eq!((hardware.gate.forward.duty, hardware.gate.reverse.duty), (200, 0));

        hardware.drive_gate(GateDrive::Close { speed: 255 });
        assert_eq!(
            (hardware.gate.forward.duty, hardware.gate.reverse.duty),
            (0, MAX_DUTY)
        );

        hardware.drive_gate(GateDrive::Stop);
        assert_eq!((hardware.gate.forward.duty, hardware.gate.reverse.duty), (0, 0));
    }

    #[test]
    fn position_is_zeroed_on_reset() {
        let mut hardware = hardware();
        hardware.encoder_source().0 = 560;
        assert_eq!(hardware.position(), 60);

        hardware.reset_position();
        hardware.encoder_source().0 = 563;
        assert_eq!(hardware.position(), 3);
    }

    #[test]
    fn indicator_follows_state() {
        let mut hardware = hardware();
        hardware.set_indicator(true);
        assert!(hardware.indicator.lit);
        hardware.set_indicator(false);
        assert!(!hardware.indicator.lit);
    }

    impl Hardware {
        fn encoder_source(&mut self) -> &mut Counter {
            self.encoder.source_mut()
        }
    }
}
