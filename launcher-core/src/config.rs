//! Launcher tuning values.
//!
//! The firmware bakes [`LauncherConfig::DEFAULT`] in at compile time. The
//! emulator exposes the same values as named options so a bench session can
//! try the alternate timings that earlier builds of the launcher shipped with
//! (30 s auto-disarm, spinning the wheels only after the gate cycle, and so
//! on).

use core::fmt;
use core::time::Duration;

/// Default debounce interval for the arm button.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);
/// Auto-disarm timeout for the standard profile.
pub const STANDARD_ARMED_TIMEOUT: Duration = Duration::from_millis(10_000);
/// Auto-disarm timeout for the extended profile.
pub const EXTENDED_ARMED_TIMEOUT: Duration = Duration::from_millis(30_000);
/// How long the gate stays open between the opening and closing phases.
pub const DEFAULT_GATE_HOLD: Duration = Duration::from_millis(5_000);
/// Encoder counts for roughly a quarter turn of the gate arm.
pub const DEFAULT_GATE_TARGET_COUNTS: i32 = 103;
/// Upper bound on a single gate phase when the encoder never reports.
pub const DEFAULT_GATE_PHASE_TIMEOUT: Duration = Duration::from_millis(2_000);
/// Gate motor duty while opening.
pub const DEFAULT_GATE_OPEN_SPEED: u8 = 70;
/// Gate motor duty while closing.
pub const DEFAULT_GATE_CLOSE_SPEED: u8 = 30;
/// No-load wheel speed at full duty.
pub const DEFAULT_MAX_RPM: u16 = 5_300;

/// When the launch wheels spin up relative to the gate cycle.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SpinUpOrder {
    /// Wheels are commanded at arm time while the gate opens.
    WithGate,
    /// Wheels are commanded once the gate cycle has finished.
    AfterGate,
}

impl SpinUpOrder {
    /// Console label for the ordering.
    pub const fn label(self) -> &'static str {
        match self {
            SpinUpOrder::WithGate => "with-gate",
            SpinUpOrder::AfterGate => "after-gate",
        }
    }
}

/// Named configuration presets.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LauncherProfile {
    Standard,
    Extended,
}

impl LauncherProfile {
    /// Returns the configuration for the profile.
    #[must_use]
    pub const fn config(self) -> LauncherConfig {
        match self {
            LauncherProfile::Standard => LauncherConfig::DEFAULT,
            LauncherProfile::Extended => {
                LauncherConfig::DEFAULT.with_armed_timeout(EXTENDED_ARMED_TIMEOUT)
            }
        }
    }

    /// Parses a profile tag, ignoring ASCII case.
    pub fn from_tag(tag: &str) -> Option<Self> {
        if tag.eq_ignore_ascii_case("standard") {
            Some(Self::Standard)
        } else if tag.eq_ignore_ascii_case("extended") {
            Some(Self::Extended)
        } else {
            None
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            LauncherProfile::Standard => "standard",
            LauncherProfile::Extended => "extended",
        }
    }
}

/// Identifier for each externally named option.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigKey {
    DebounceMs,
    ArmedTimeoutMs,
    GateHoldMs,
    GateTargetCounts,
    GatePhaseTimeoutMs,
    GateOpenSpeed,
    GateCloseSpeed,
    MaxRpm,
    SpinUp,
    Chime,
}

/// Every option in display order.
pub const ALL_CONFIG_KEYS: [ConfigKey; 10] = [
    ConfigKey::DebounceMs,
    ConfigKey::ArmedTimeoutMs,
    ConfigKey::GateHoldMs,
    ConfigKey::GateTargetCounts,
    ConfigKey::GatePhaseTimeoutMs,
    ConfigKey::GateOpenSpeed,
    ConfigKey::GateCloseSpeed,
    ConfigKey::MaxRpm,
    ConfigKey::SpinUp,
    ConfigKey::Chime,
];

impl ConfigKey {
    /// Option name as used by the console.
    pub const fn name(self) -> &'static str {
        match self {
            ConfigKey::DebounceMs => "debounce_ms",
            ConfigKey::ArmedTimeoutMs => "armed_timeout_ms",
            ConfigKey::GateHoldMs => "gate_hold_ms",
            ConfigKey::GateTargetCounts => "gate_target_counts",
            ConfigKey::GatePhaseTimeoutMs => "gate_phase_timeout_ms",
            ConfigKey::GateOpenSpeed => "gate_open_speed",
            ConfigKey::GateCloseSpeed => "gate_close_speed",
            ConfigKey::MaxRpm => "max_rpm",
            ConfigKey::SpinUp => "spin_up",
            ConfigKey::Chime => "chime",
        }
    }

    /// One-line description for console help.
    pub const fn summary(self) -> &'static str {
        match self {
            ConfigKey::DebounceMs => "how long the button must read steady before a press counts",
            ConfigKey::ArmedTimeoutMs => "auto-disarm delay after arming",
            ConfigKey::GateHoldMs => "time the gate stays open",
            ConfigKey::GateTargetCounts => "encoder counts from closed to open",
            ConfigKey::GatePhaseTimeoutMs => "longest the gate motor runs in one direction",
            ConfigKey::GateOpenSpeed => "gate motor duty while opening (0-255)",
            ConfigKey::GateCloseSpeed => "gate motor duty while closing (0-255)",
            ConfigKey::MaxRpm => "wheel speed at full duty, for the idle display",
            ConfigKey::SpinUp => "start the wheels with-gate or after-gate",
            ConfigKey::Chime => "play the arming chime (on/off)",
        }
    }

    /// Looks up an option by name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_CONFIG_KEYS
            .iter()
            .copied()
            .find(|key| key.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value supplied for a named option.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigValue {
    Number(u32),
    Switch(bool),
    SpinUp(SpinUpOrder),
}

/// Rejection reasons for configuration changes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    ZeroDebounce,
    ZeroArmedTimeout,
    ZeroPhaseTimeout,
    NonPositiveTargetCounts,
    ZeroMaxRpm,
    /// The value does not fit the option's range.
    OutOfRange(ConfigKey),
    /// The value has the wrong shape for the option (e.g. a number for `chime`).
    WrongKind(ConfigKey),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroDebounce => f.write_str("debounce_ms must be non-zero"),
            ConfigError::ZeroArmedTimeout => f.write_str("armed_timeout_ms must be non-zero"),
            ConfigError::ZeroPhaseTimeout => f.write_str("gate_phase_timeout_ms must be non-zero"),
            ConfigError::NonPositiveTargetCounts => {
                f.write_str("gate_target_counts must be positive")
            }
            ConfigError::ZeroMaxRpm => f.write_str("max_rpm must be non-zero"),
            ConfigError::OutOfRange(key) => write!(f, "value out of range for {key}"),
            ConfigError::WrongKind(key) => write!(f, "unsupported value for {key}"),
        }
    }
}

/// Complete set of launcher tunables.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LauncherConfig {
    pub debounce: Duration,
    pub armed_timeout: Duration,
    pub gate_hold: Duration,
    pub gate_target_counts: i32,
    pub gate_phase_timeout: Duration,
    pub gate_open_speed: u8,
    pub gate_close_speed: u8,
    pub max_rpm: u16,
    pub spin_up: SpinUpOrder,
    /// Play the arming melody while armed.
    pub chime: bool,
}

impl LauncherConfig {
    /// Standard profile: 10 s auto-disarm, wheels spin up with the gate.
    pub const DEFAULT: Self = Self {
        debounce: DEFAULT_DEBOUNCE,
        armed_timeout: STANDARD_ARMED_TIMEOUT,
        gate_hold: DEFAULT_GATE_HOLD,
        gate_target_counts: DEFAULT_GATE_TARGET_COUNTS,
        gate_phase_timeout: DEFAULT_GATE_PHASE_TIMEOUT,
        gate_open_speed: DEFAULT_GATE_OPEN_SPEED,
        gate_close_speed: DEFAULT_GATE_CLOSE_SPEED,
        max_rpm: DEFAULT_MAX_RPM,
        spin_up: SpinUpOrder::WithGate,
        chime: true,
    };

    #[must_use]
    pub const fn with_armed_timeout(mut self, timeout: Duration) -> Self {
        self.armed_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_spin_up(mut self, order: SpinUpOrder) -> Self {
        self.spin_up = order;
        self
    }

    #[must_use]
    pub const fn with_chime(mut self, chime: bool) -> Self {
        self.chime = chime;
        self
    }

    /// Checks the invariants the controller relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce.is_zero() {
            return Err(ConfigError::ZeroDebounce);
        }
        if self.armed_timeout.is_zero() {
            return Err(ConfigError::ZeroArmedTimeout);
        }
        if self.gate_phase_timeout.is_zero() {
            return Err(ConfigError::ZeroPhaseTimeout);
        }
        if self.gate_target_counts <= 0 {
            return Err(ConfigError::NonPositiveTargetCounts);
        }
        if self.max_rpm == 0 {
            return Err(ConfigError::ZeroMaxRpm);
        }
        Ok(())
    }

    /// Returns a copy with one named option replaced and re-validated.
    pub fn with_option(&self, key: ConfigKey, value: ConfigValue) -> Result<Self, ConfigError> {
        let mut next = *self;
        match (key, value) {
            (ConfigKey::DebounceMs, ConfigValue::Number(ms)) => {
                next.debounce = Duration::from_millis(u64::from(ms));
            }
            (ConfigKey::ArmedTimeoutMs, ConfigValue::Number(ms)) => {
                next.armed_timeout = Duration::from_millis(u64::from(ms));
            }
            (ConfigKey::GateHoldMs, ConfigValue::Number(ms)) => {
                next.gate_hold = Duration::from_millis(u64::from(ms));
            }
            (ConfigKey::GateTargetCounts, ConfigValue::Number(counts)) => {
                next.gate_target_counts =
                    i32::try_from(counts).map_err(|_| ConfigError::OutOfRange(key))?;
            }
            (ConfigKey::GatePhaseTimeoutMs, ConfigValue::Number(ms)) => {
                next.gate_phase_timeout = Duration::from_millis(u64::from(ms));
            }
            (ConfigKey::GateOpenSpeed, ConfigValue::Number(speed)) => {
                next.gate_open_speed =
                    u8::try_from(speed).map_err(|_| ConfigError::OutOfRange(key))?;
            }
            (ConfigKey::GateCloseSpeed, ConfigValue::Number(speed)) => {
                next.gate_close_speed =
                    u8::try_from(speed).map_err(|_| ConfigError::OutOfRange(key))?;
            }
            (ConfigKey::MaxRpm, ConfigValue::Number(rpm)) => {
                next.max_rpm = u16::try_from(rpm).map_err(|_| ConfigError::OutOfRange(key))?;
            }
            (ConfigKey::SpinUp, ConfigValue::SpinUp(order)) => next.spin_up = order,
            (ConfigKey::Chime, ConfigValue::Switch(enabled)) => next.chime = enabled,
            _ => return Err(ConfigError::WrongKind(key)),
        }
        next.validate()?;
        Ok(next)
    }

    /// Reads a named option back as a [`ConfigValue`].
    #[must_use]
    pub fn option(&self, key: ConfigKey) -> ConfigValue {
        match key {
            ConfigKey::DebounceMs => ConfigValue::Number(millis_u32(self.debounce)),
            ConfigKey::ArmedTimeoutMs => ConfigValue::Number(millis_u32(self.armed_timeout)),
            ConfigKey::GateHoldMs => ConfigValue::Number(millis_u32(self.gate_hold)),
            ConfigKey::GateTargetCounts => {
                ConfigValue::Number(u32::try_from(self.gate_target_counts).unwrap_or(0))
            }
            ConfigKey::GatePhaseTimeoutMs => {
                ConfigValue::Number(millis_u32(self.gate_phase_timeout))
            }
            ConfigKey::GateOpenSpeed => ConfigValue::Number(u32::from(self.gate_open_speed)),
            ConfigKey::GateCloseSpeed => ConfigValue::Number(u32::from(self.gate_close_speed)),
            ConfigKey::MaxRpm => ConfigValue::Number(u32::from(self.max_rpm)),
            ConfigKey::SpinUp => ConfigValue::SpinUp(self.spin_up),
            ConfigKey::Chime => ConfigValue::Switch(self.chime),
        }
    }
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Number(value) => write!(f, "{value}"),
            ConfigValue::Switch(true) => f.write_str("on"),
            ConfigValue::Switch(false) => f.write_str("off"),
            ConfigValue::SpinUp(order) => f.write_str(order.label()),
        }
    }
}

fn millis_u32(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(LauncherConfig::DEFAULT.validate(), Ok(()));
        assert_eq!(LauncherConfig::DEFAULT.armed_timeout, Duration::from_secs(10));
        assert_eq!(LauncherConfig::DEFAULT.gate_target_counts, 103);
    }

    #[test]
    fn extended_profile_only_changes_timeout() {
        let extended = LauncherProfile::Extended.config();
        assert_eq!(extended.armed_timeout, Duration::from_secs(30));
        assert_eq!(
            extended.with_armed_timeout(STANDARD_ARMED_TIMEOUT),
            LauncherConfig::DEFAULT
        );
    }

    #[test]
    fn profiles_parse_case_insensitively() {
        assert_eq!(
            LauncherProfile::from_tag("Extended"),
            Some(LauncherProfile::Extended)
        );
        assert_eq!(LauncherProfile::from_tag("turbo"), None);
    }

    #[test]
    fn named_options_round_trip_through_lookup() {
        for key in ALL_CONFIG_KEYS {
            assert_eq!(ConfigKey::from_name(key.name()), Some(key));
        }
        assert_eq!(
            ConfigKey::from_name("ARMED_TIMEOUT_MS"),
            Some(ConfigKey::ArmedTimeoutMs)
        );
        assert_eq!(ConfigKey::from_name("armed_timeout"), None);
    }

    #[test]
    fn with_option_updates_and_validates() {
        let config = LauncherConfig::DEFAULT
            .with_option(ConfigKey::ArmedTimeoutMs, ConfigValue::Number(30_000))
            .expect("timeout update");
        assert_eq!(config.armed_timeout, Duration::from_secs(30));
        assert_eq!(
            config.option(ConfigKey::ArmedTimeoutMs),
            ConfigValue::Number(30_000)
        );

        assert_eq!(
            LauncherConfig::DEFAULT.with_option(ConfigKey::DebounceMs, ConfigValue::Number(0)),
            Err(ConfigError::ZeroDebounce)
        );
        assert_eq!(
            LauncherConfig::DEFAULT.with_option(ConfigKey::GateOpenSpeed, ConfigValue::Number(300)),
            Err(ConfigError::OutOfRange(ConfigKey::GateOpenSpeed))
        );
        assert_eq!(
            LauncherConfig::DEFAULT.with_option(ConfigKey::Chime, ConfigValue::Number(1)),
            Err(ConfigError::WrongKind(ConfigKey::Chime))
        );
    }

    #[test]
    fn spin_up_option_accepts_ordering() {
        let config = LauncherConfig::DEFAULT
            .with_option(
                ConfigKey::SpinUp,
                ConfigValue::SpinUp(SpinUpOrder::AfterGate),
            )
            .expect("spin-up update");
        assert_eq!(config.spin_up, SpinUpOrder::AfterGate);
    }
}
