//! Per-bit suppression of mechanical contact bounce.
//!
//! A key contact that toggles again before its settle window has elapsed is electrical noise, not
//! a performance; the filter reverts such bits to their previous value. Each bit re-arms its
//! window from the timestamp of its own last accepted toggle.

use crate::bits::{BANK_BITS, bit_index};
use embassy_time::{Duration, Instant};

/// Settle-time filter covering every bit of one bank.
pub struct DebounceFilter {
    window: Duration,
    /// Timestamp of the last accepted toggle per bit; `None` until a bit first toggles.
    last_toggle: [Option<Instant>; BANK_BITS],
}

impl DebounceFilter {
    /// Constructs a filter with the given settle window. Bits that have never toggled pass freely.
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            last_toggle: [None; BANK_BITS],
        }
    }

    /// Filters one port byte of a candidate reading against the previous accepted reading.
    ///
    /// `byte` is the bank-relative index of the port byte, used to address the per-bit timestamp
    /// slots. Changed bits younger than the window are reverted to `previous`; accepted toggles
    /// record `now` as the bit's new last-toggle time. Returns the corrected byte.
    pub fn filter(&mut self, byte: usize, previous: u8, candidate: u8, now: Instant) -> u8 {
        let changed = candidate ^ previous;
        if changed == 0 {
            return candidate;
        }

        let mut rejected = 0u8;
        for bit in 0..8 {
            if changed >> bit & 1 == 0 {
                continue;
            }
            let slot = &mut self.last_toggle[bit_index(byte, bit)];
            match *slot {
                Some(last) if now.duration_since(last) < self.window => rejected |= 1 << bit,
                _ => *slot = Some(now),
            }
        }

        // revert any bits that changed too fast
        (candidate & !rejected) | (previous & rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_micros(50_000);

    fn at(micros: u64) -> Instant {
        Instant::from_micros(micros)
    }

    #[test]
    fn first_toggle_always_passes() {
        let mut filter = DebounceFilter::new(WINDOW);
        assert_eq!(0b0000_0001, filter.filter(0, 0b0000_0000, 0b0000_0001, at(10)));
    }

    #[test]
    fn bounce_within_window_is_reverted() {
        let mut filter = DebounceFilter::new(WINDOW);
        assert_eq!(0b0000_0001, filter.filter(0, 0b0000_0000, 0b0000_0001, at(1_000)));
        // contact opens again 5ms later
        assert_eq!(
            0b0000_0001,
            filter.filter(0, 0b0000_0001, 0b0000_0000, at(6_000)),
            "Release during the settle window should be suppressed"
        );
    }

    #[test]
    fn toggle_after_window_is_accepted() {
        let mut filter = DebounceFilter::new(WINDOW);
        assert_eq!(0b0000_0001, filter.filter(0, 0b0000_0000, 0b0000_0001, at(1_000)));
        assert_eq!(
            0b0000_0000,
            filter.filter(0, 0b0000_0001, 0b0000_0000, at(51_000)),
            "Release outside the settle window should be accepted"
        );
    }

    #[test]
    fn accepted_toggle_rearms_window() {
        let mut filter = DebounceFilter::new(WINDOW);
        filter.filter(0, 0b0000_0000, 0b0000_0001, at(0));
        filter.filter(0, 0b0000_0001, 0b0000_0000, at(60_000));
        // 10ms after the accepted release, not 70ms after the initial press
        assert_eq!(
            0b0000_0000,
            filter.filter(0, 0b0000_0000, 0b0000_0001, at(70_000)),
            "Window should be measured from the last accepted toggle"
        );
    }

    #[test]
    fn bits_are_filtered_independently() {
        let mut filter = DebounceFilter::new(WINDOW);
        filter.filter(0, 0b0000_0000, 0b0000_0011, at(0));
        // bit 0 bounces, bit 2 is a fresh press
        assert_eq!(
            0b0000_0111,
            filter.filter(0, 0b0000_0011, 0b0000_0110, at(5_000)),
            "Only the bouncing bit should revert"
        );
    }

    #[test]
    fn timestamp_slots_do_not_alias_across_bytes() {
        let mut filter = DebounceFilter::new(WINDOW);
        filter.filter(0, 0b0000_0000, 0b0000_0001, at(0));
        // same bit position in a different port byte has its own slot
        assert_eq!(0b0000_0001, filter.filter(5, 0b0000_0000, 0b0000_0001, at(5_000)));
    }

    #[test]
    fn unchanged_byte_is_untouched() {
        let mut filter = DebounceFilter::new(WINDOW);
        assert_eq!(0b1010_1010, filter.filter(1, 0b1010_1010, 0b1010_1010, at(0)));
    }

    /// Exercises the filter against the real clock source via the mock driver, the way the
    /// firmware drives it (one `Instant::now()` per cycle).
    #[test]
    fn tracks_driver_time() {
        let driver = embassy_time::MockDriver::get();
        let mut filter = DebounceFilter::new(WINDOW);

        let press = filter.filter(2, 0b0000_0000, 0b0001_0000, Instant::now());
        assert_eq!(0b0001_0000, press);

        driver.advance(Duration::from_micros(5_000));
        let bounce = filter.filter(2, press, 0b0000_0000, Instant::now());
        assert_eq!(0b0001_0000, bounce, "5ms is inside the settle window");

        driver.advance(Duration::from_micros(50_000));
        let release = filter.filter(2, bounce, 0b0000_0000, Instant::now());
        assert_eq!(0b0000_0000, release, "55ms is past the settle window");
    }
}
