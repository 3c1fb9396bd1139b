//! Monotonic time abstraction shared by the firmware and the emulator.

use core::ops::Add;
use core::time::Duration;

/// Monotonic timestamp used to evaluate debounce windows, gate phase
/// deadlines and the auto-disarm timeout.
///
/// Firmware wraps the Embassy instant; the emulator uses a simulated
/// millisecond clock.
pub trait ControlInstant: Copy + Ord + Add<Duration, Output = Self> {
    /// Returns the saturating duration from `earlier` to `self`.
    fn saturating_duration_since(&self, earlier: Self) -> Duration;

    /// Returns `true` once `self` is at or past `start + span`.
    fn has_elapsed(&self, start: Self, span: Duration) -> bool {
        *self >= start + span
    }
}
