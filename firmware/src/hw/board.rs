//! STM32G0B1 bindings for the launcher adapters.
//!
//! | Function              | Pin(s)            | Peripheral        |
//! |-----------------------|-------------------|-------------------|
//! | Wheel A fwd/rev       | PA0 / PA1         | TIM2 CH1 / CH2    |
//! | Wheel B fwd/rev       | PA2 / PA3         | TIM2 CH3 / CH4    |
//! | Gate open/close       | PB14 / PB15       | TIM15 CH1 / CH2   |
//! | Gate encoder A/B      | PA6 / PA7         | TIM3 encoder mode |
//! | Buzzer                | PA4               | TIM14 CH1         |
//! | Speed potentiometer   | PB0               | ADC1 IN8          |
//! | Arm button            | PC13 (pull-down)  | EXTI13            |
//! | ARMED indicator       | PA5               | GPIO              |
//! | LCD backpack SCL/SDA  | PB8 / PB9         | I2C1              |

use embassy_stm32::adc::{Adc, AnyAdcChannel, SampleTime};
use embassy_stm32::gpio::Output;
use embassy_stm32::peripherals::{ADC1, TIM2, TIM3, TIM14, TIM15};
use embassy_stm32::time::hz;
use embassy_stm32::timer::qei::Qei;
use embassy_stm32::timer::simple_pwm::{SimplePwm, SimplePwmChannel};
use launcher_core::presentation::Tone;

use super::encoder::CountSource;
use super::outputs::LauncherHardware;

/// Motor carrier frequency.
pub const MOTOR_PWM_HZ: u32 = 20_000;

pub type WheelChannel = SimplePwmChannel<'static, TIM2>;
pub type GateChannel = SimplePwmChannel<'static, TIM15>;
pub type BoardHardware = LauncherHardware<WheelChannel, GateChannel, Output<'static>, Qei<'static, TIM3>>;

impl CountSource for Qei<'_, TIM3> {
    fn raw_count(&mut self) -> u16 {
        self.count()
    }
}

/// Speed potentiometer on a 12-bit ADC channel.
pub struct Potentiometer<'d> {
    adc: Adc<'d, ADC1>,
    channel: AnyAdcChannel<ADC1>,
}

impl<'d> Potentiometer<'d> {
    pub fn new(mut adc: Adc<'d, ADC1>, channel: AnyAdcChannel<ADC1>) -> Self {
        adc.set_sample_time(SampleTime::CYCLES79_5);
        Self { adc, channel }
    }

    /// Raw reading in `0..=4095`.
    pub fn read(&mut self) -> u16 {
        self.adc.blocking_read(&mut self.channel)
    }
}

/// Piezo buzzer on its own timer so each note can retune the carrier.
pub struct Buzzer<'d> {
    pwm: SimplePwm<'d, TIM14>,
}

impl<'d> Buzzer<'d> {
    pub fn new(pwm: SimplePwm<'d, TIM14>) -> Self {
        let mut buzzer = Self { pwm };
        buzzer.play(None);
        buzzer
    }

    pub fn play(&mut self, tone: Option<Tone>) {
        match tone {
            Some(tone) => {
                self.pwm.set_frequency(hz(u32::from(tone.frequency_hz)));
                let mut channel = self.pwm.ch1();
                channel.set_duty_cycle_percent(50);
                channel.enable();
            }
            None => self.pwm.ch1().disable(),
        }
    }
}
