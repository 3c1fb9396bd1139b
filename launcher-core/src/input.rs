//! Button debouncing.
//!
//! The arm button is sampled once per control tick. A press is only reported
//! after the line has been HIGH and unchanged for the debounce interval, and
//! it is reported once: the press stays latched until the line has settled
//! LOW again, so holding the button or bouncing on release never re-arms.

use core::time::Duration;

use crate::time::ControlInstant;

/// Level-sampled debouncer with a press latch.
#[derive(Clone, Debug)]
pub struct Debouncer<I> {
    interval: Duration,
    last_level: bool,
    last_change: Option<I>,
    latched: bool,
}

impl<I> Debouncer<I>
where
    I: ControlInstant,
{
    /// Creates a debouncer that assumes the button starts released.
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_level: false,
            last_change: None,
            latched: false,
        }
    }

    /// Returns the configured debounce interval.
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Replaces the debounce interval without touching the latch.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Returns `true` while a recognized press has not yet been released.
    pub const fn is_latched(&self) -> bool {
        self.latched
    }

    /// Restarts the stability window after an edge seen outside the sampling
    /// cadence (e.g. reported by the EXTI interrupt between two ticks).
    pub fn note_edge(&mut self, now: I) {
        self.last_change = Some(now);
    }

    /// Feeds one raw sample. Returns `true` exactly once per physical press.
    pub fn sample(&mut self, level: bool, now: I) -> bool {
        if level != self.last_level {
            self.last_level = level;
            self.last_change = Some(now);
        }

        if !self.is_stable(now) {
            return false;
        }

        if level {
            if self.latched {
                false
            } else {
                self.latched = true;
                true
            }
        } else {
            self.latched = false;
            false
        }
    }

    fn is_stable(&self, now: I) -> bool {
        match self.last_change {
            Some(changed_at) => now.has_elapsed(changed_at, self.interval),
            None => true,
        }
    }
}
