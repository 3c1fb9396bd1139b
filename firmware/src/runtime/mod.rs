use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::adc::{Adc, AdcChannel};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Level, Output, OutputType, Pull, Speed};
use embassy_stm32::i2c::{self, I2c};
use embassy_stm32::time::{Hertz, hz};
use embassy_stm32::timer::low_level::CountingMode;
use embassy_stm32::timer::qei::{Qei, QeiPin};
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_sync::signal::Signal;
use embassy_time::Delay;
use launcher_core::config::LauncherConfig;
use launcher_core::controller::LauncherController;

use crate::hw::board::{BoardHardware, Buzzer, MOTOR_PWM_HZ, Potentiometer};
use crate::hw::encoder::QuadratureCounter;
use crate::hw::lcd::{CharacterLcd, PCF8574_ADDRESS};
use crate::hw::outputs::{HBridge, LauncherHardware};
use crate::launcher::presenter::SignalPresenter;
use crate::launcher::{FirmwareInstant, FrameSignal, ToneSignal, log_startup};

mod control_task;
mod display_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

embassy_stm32::bind_interrupts!(struct I2cIrqs {
    I2C1 => i2c::EventInterruptHandler<hal::peripherals::I2C1>, i2c::ErrorInterruptHandler<hal::peripherals::I2C1>;
});

const LCD_I2C_HZ: u32 = 100_000;

pub(super) static FRAMES: FrameSignal = Signal::new();
pub(super) static TONES: ToneSignal = Signal::new();

pub type FirmwareController =
    LauncherController<FirmwareInstant, BoardHardware, SignalPresenter<'static>>;

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        PA0,
        PA1,
        PA2,
        PA3,
        PA4,
        PA5,
        PA6,
        PA7,
        PB0,
        PB8,
        PB9,
        PB14,
        PB15,
        PC13,
        EXTI13,
        ADC1,
        I2C1,
        DMA1_CH1,
        DMA1_CH2,
        TIM2,
        TIM3,
        TIM14,
        TIM15,
        ..
    } = hal::init(config);

    let mut wheels = SimplePwm::new(
        TIM2,
        Some(PwmPin::new_ch1(PA0, OutputType::PushPull)),
        Some(PwmPin::new_ch2(PA1, OutputType::PushPull)),
        Some(PwmPin::new_ch3(PA2, OutputType::PushPull)),
        Some(PwmPin::new_ch4(PA3, OutputType::PushPull)),
        hz(MOTOR_PWM_HZ),
        CountingMode::EdgeAlignedUp,
    )
    .split();
    let mut gate = SimplePwm::new(
        TIM15,
        Some(PwmPin::new_ch1(PB14, OutputType::PushPull)),
        Some(PwmPin::new_ch2(PB15, OutputType::PushPull)),
        None,
        None,
        hz(MOTOR_PWM_HZ),
        CountingMode::EdgeAlignedUp,
    )
    .split();

    for channel in [
        &mut wheels.ch1,
        &mut wheels.ch2,
        &mut wheels.ch3,
        &mut wheels.ch4,
    ] {
        channel.enable();
    }
    gate.ch1.enable();
    gate.ch2.enable();

    let encoder = Qei::new(TIM3, QeiPin::new_ch1(PA6), QeiPin::new_ch2(PA7));
    let indicator = Output::new(PA5, Level::Low, Speed::Low);
    let hardware: BoardHardware = LauncherHardware::new(
        HBridge::new(wheels.ch1, wheels.ch2),
        HBridge::new(wheels.ch3, wheels.ch4),
        HBridge::new(gate.ch1, gate.ch2),
        indicator,
        QuadratureCounter::new(encoder),
    );

    let mut pot = Potentiometer::new(Adc::new(ADC1), PB0.degrade_adc());
    let button = ExtiInput::new(PC13, EXTI13, Pull::Down);

    let i2c = I2c::new(
        I2C1,
        PB8,
        PB9,
        I2cIrqs,
        DMA1_CH1,
        DMA1_CH2,
        Hertz(LCD_I2C_HZ),
        i2c::Config::default(),
    );
    let lcd = CharacterLcd::new(i2c, Delay, PCF8574_ADDRESS);
    let buzzer = Buzzer::new(SimplePwm::new(
        TIM14,
        Some(PwmPin::new_ch1(PA4, OutputType::PushPull)),
        None,
        None,
        None,
        hz(1_000),
        CountingMode::EdgeAlignedUp,
    ));

    let config = LauncherConfig::DEFAULT;
    let mut controller: FirmwareController = LauncherController::new(
        config,
        hardware,
        SignalPresenter::new(&FRAMES, &TONES),
    );
    controller.start(pot.read());
    log_startup(
        controller.desired_duty(),
        u64::try_from(config.armed_timeout.as_millis()).unwrap_or(u64::MAX),
    );

    spawner
        .spawn(display_task::run(lcd, buzzer, &FRAMES, &TONES))
        .expect("failed to spawn display task");
    spawner
        .spawn(control_task::run(controller, button, pot))
        .expect("failed to spawn control task");

    core::future::pending::<()>().await;
}
