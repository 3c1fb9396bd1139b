//! Potentiometer to motor duty mapping.

/// Largest value the 12-bit ADC reports.
pub const ADC_MAX: u16 = 4_095;
/// Largest PWM duty (8-bit resolution).
pub const DUTY_MAX: u8 = u8::MAX;

/// Motor duty in `0..=255`. Zero means stopped.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Duty(u8);

impl Duty {
    pub const STOPPED: Self = Self(0);
    pub const FULL: Self = Self(DUTY_MAX);

    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn is_stopped(self) -> bool {
        self.0 == 0
    }

    /// Maps a raw ADC sample onto the duty range, truncating.
    ///
    /// Samples above [`ADC_MAX`] are clamped first.
    #[must_use]
    pub fn from_raw(raw: u16) -> Self {
        let raw = u32::from(raw.min(ADC_MAX));
        let scaled = raw * u32::from(DUTY_MAX) / u32::from(ADC_MAX);
        // scaled <= 255 because raw <= ADC_MAX
        Self(u8::try_from(scaled).unwrap_or(DUTY_MAX))
    }

    /// Estimated wheel speed for this duty, assuming linear scaling up to
    /// `max_rpm` at full duty.
    #[must_use]
    pub fn rpm(self, max_rpm: u16) -> u16 {
        rpm_for(self, max_rpm)
    }
}

impl From<Duty> for u8 {
    fn from(duty: Duty) -> Self {
        duty.0
    }
}

/// `duty * max_rpm / 255`, truncating.
#[must_use]
pub fn rpm_for(duty: Duty, max_rpm: u16) -> u16 {
    let rpm = u32::from(duty.get()) * u32::from(max_rpm) / u32::from(DUTY_MAX);
    u16::try_from(rpm).unwrap_or(max_rpm)
}

/// Number of filled bar cells out of `width` for the given speed.
#[must_use]
pub fn bar_cells(rpm: u16, max_rpm: u16, width: usize) -> usize {
    if max_rpm == 0 {
        return 0;
    }
    let rpm = usize::from(rpm.min(max_rpm));
    (rpm * width / usize::from(max_rpm)).min(width)
}
