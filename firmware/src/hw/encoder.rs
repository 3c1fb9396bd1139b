//! Software-zeroed quadrature position.

/// Free-running 16-bit quadrature count, as read from a timer in encoder
/// mode.
pub trait CountSource {
    fn raw_count(&mut self) -> u16;
}

/// Tracks a signed position across wraps of the hardware counter.
///
/// Each read folds the wrapping difference since the previous read into an
/// `i32`, so the counter must be polled at least once per 32767 counts.
pub struct QuadratureCounter<C> {
    source: C,
    last_raw: u16,
    position: i32,
}

impl<C: CountSource> QuadratureCounter<C> {
    pub fn new(mut source: C) -> Self {
        let last_raw = source.raw_count();
        Self {
            source,
            last_raw,
            position: 0,
        }
    }

    /// Makes the current shaft angle position zero.
    pub fn zero(&mut self) {
        self.last_raw = self.source.raw_count();
        self.position = 0;
    }

    /// Position relative to the last [`zero`](Self::zero).
    pub fn position(&mut self) -> i32 {
        let raw = self.source.raw_count();
        let delta = i16::from_ne_bytes(raw.wrapping_sub(self.last_raw).to_ne_bytes());
        self.last_raw = raw;
        self.position = self.position.wrapping_add(i32::from(delta));
        self.position
    }

    pub fn source_mut(&mut self) -> &mut C {
        &mut self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter(u16);

    impl CountSource for Counter {
        fn raw_count(&mut self) -> u16 {
            self.0
        }
    }

    #[test]
    fn zero_is_relative_to_current_count() {
        let mut encoder = QuadratureCounter::new(Counter(40_000));
        assert_eq!(encoder.position(), 0);
    }

    #[test]
    fn follows_counter_through_wrap() {
        let mut encoder = QuadratureCounter::new(Counter(65_500));

        encoder.source.0 = 65_535;
        assert_eq!(encoder.position(), 35);
        encoder.source.0 = 67;
        assert_eq!(encoder.position(), 103);

        encoder.source.0 = 65_530;
        assert_eq!(encoder.position(), 30);
        encoder.source.0 = 65_494;
        assert_eq!(encoder.position(), -6);
    }

    #[test]
    fn zero_discards_previous_travel() {
        let mut encoder = QuadratureCounter::new(Counter(10));
        encoder.source.0 = 90;
        assert_eq!(encoder.position(), 80);

        encoder.zero();
        assert_eq!(encoder.position(), 0);
        encoder.source.0 = 85;
        assert_eq!(encoder.position(), -5);
    }
}
