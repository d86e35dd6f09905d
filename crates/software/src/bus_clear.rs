//! Recovery state machine for a wedged two-wire bus.
//!
//! A slave that was mid-transfer when the master reset can hold the data line low forever,
//! waiting for clocks that never come. The cure is to supply those clocks manually until the
//! slave releases the line, then issue a synthetic start/stop to resynchronize everyone. The
//! machine runs once per scan cycle as a standing safety net, not only on suspected faults.
//!
//! Line-level access goes through [`BusLines`], which the firmware implements over open-drain
//! pins; every wait is bounded here, so a fault always surfaces as an [`Err`] within roughly
//! two seconds.

/// Low-level access to the bus wires while the bus controller is detached.
///
/// Implementations must treat both lines as open-drain: released means pulled high externally,
/// never driven high.
pub trait BusLines {
    /// Samples the clock line; `true` means something is holding it low.
    fn scl_is_low(&mut self) -> bool;
    /// Samples the data line; `true` means something is holding it low.
    fn sda_is_low(&mut self) -> bool;
    /// Drives the clock line low for at least 5 µs, then releases it for at least 5 µs,
    /// supplying one manual clock to a stuck slave.
    fn pulse_scl(&mut self);
    /// Waits one clock-stretch poll interval (on the order of 100 ms).
    fn stretch_wait(&mut self);
    /// Pulls the data line low and releases it with start/stop timing. With a single master a
    /// start (or repeated start) followed by a stop clears every slave's bus state.
    fn issue_start_stop(&mut self);
}

/// Manual clock pulses supplied before giving up on a stuck data line; more than 2 × 9 clocks,
/// enough to flush any byte plus its acknowledge bit.
pub const SCL_PULSE_LIMIT: u8 = 20;

/// Clock-stretch polls (of one [`BusLines::stretch_wait`] each) tolerated after every pulse
/// before declaring the clock line dead; with 100 ms waits this is the ~2 s stretch budget.
pub const STRETCH_POLL_LIMIT: u8 = 20;

/// The three ways a two-wire bus can stay wedged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusFault {
    /// The clock line was already low on entry; this node cannot become bus master.
    ClockHeldLow,
    /// A slave stretched the clock past the poll budget during recovery pulsing.
    ClockStretchTimeout,
    /// The data line stayed low after all recovery pulses.
    DataHeldLow,
}

impl BusFault {
    /// Legacy numeric status (healthy = 0, faults = 1–3), kept for log and protocol parity with
    /// consoles running the original encoder.
    pub const fn code(&self) -> u8 {
        match self {
            Self::ClockHeldLow => 1,
            Self::ClockStretchTimeout => 2,
            Self::DataHeldLow => 3,
        }
    }
}

/// Checks the bus and, if the data line is stuck, attempts recovery.
///
/// On a healthy bus this samples both lines, issues the synthetic start/stop, and returns
/// `Ok(())` without pulsing. Faults abort immediately with the classification above; no retry
/// happens beyond the pulsing loop itself.
pub fn clear_bus(lines: &mut impl BusLines) -> Result<(), BusFault> {
    if lines.scl_is_low() {
        return Err(BusFault::ClockHeldLow);
    }

    let mut sda_low = lines.sda_is_low();
    let mut pulses_left = SCL_PULSE_LIMIT;
    while sda_low && pulses_left > 0 {
        pulses_left -= 1;
        lines.pulse_scl();

        // the slave may legitimately stretch the clock after a pulse; wait it out, bounded
        let mut scl_low = lines.scl_is_low();
        let mut polls_left = STRETCH_POLL_LIMIT;
        while scl_low && polls_left > 0 {
            polls_left -= 1;
            lines.stretch_wait();
            scl_low = lines.scl_is_low();
        }
        if scl_low {
            return Err(BusFault::ClockStretchTimeout);
        }

        sda_low = lines.sda_is_low();
    }
    if sda_low {
        return Err(BusFault::DataHeldLow);
    }

    lines.issue_start_stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scripted bus: SCL is stuck for the first `scl_low_reads` samples, SDA releases after
    /// `sda_low_until_pulse` manual clocks.
    struct FakeLines {
        scl_low_reads: u32,
        sda_low_until_pulse: u32,
        pulses: u32,
        stretch_waits: u32,
        start_stops: u32,
    }

    impl FakeLines {
        fn healthy() -> Self {
            Self::new(0, 0)
        }

        fn new(scl_low_reads: u32, sda_low_until_pulse: u32) -> Self {
            Self {
                scl_low_reads,
                sda_low_until_pulse,
                pulses: 0,
                stretch_waits: 0,
                start_stops: 0,
            }
        }
    }

    impl BusLines for FakeLines {
        fn scl_is_low(&mut self) -> bool {
            if self.scl_low_reads > 0 {
                self.scl_low_reads -= 1;
                true
            } else {
                false
            }
        }

        fn sda_is_low(&mut self) -> bool {
            self.pulses < self.sda_low_until_pulse
        }

        fn pulse_scl(&mut self) {
            self.pulses += 1;
        }

        fn stretch_wait(&mut self) {
            self.stretch_waits += 1;
        }

        fn issue_start_stop(&mut self) {
            self.start_stops += 1;
        }
    }

    #[test]
    fn healthy_bus_returns_ok_without_pulsing() {
        let mut lines = FakeLines::healthy();
        assert_eq!(Ok(()), clear_bus(&mut lines));
        assert_eq!(0, lines.pulses, "Healthy bus needs no manual clocks");
        assert_eq!(1, lines.start_stops, "Start/stop is always issued on success");
    }

    #[test]
    fn stuck_clock_aborts_before_pulsing() {
        let mut lines = FakeLines::new(1, 5);
        assert_eq!(Err(BusFault::ClockHeldLow), clear_bus(&mut lines));
        assert_eq!(0, lines.pulses);
        assert_eq!(0, lines.start_stops);
    }

    #[test]
    fn stuck_data_line_releases_after_pulses() {
        let mut lines = FakeLines::new(0, 3);
        assert_eq!(Ok(()), clear_bus(&mut lines));
        assert_eq!(3, lines.pulses, "One pulse per stuck sample");
        assert_eq!(1, lines.start_stops);
    }

    #[test]
    fn data_line_stuck_through_all_retries() {
        let mut lines = FakeLines::new(0, u32::MAX);
        assert_eq!(Err(BusFault::DataHeldLow), clear_bus(&mut lines));
        assert_eq!(u32::from(SCL_PULSE_LIMIT), lines.pulses);
        assert_eq!(0, lines.start_stops);
    }

    #[test]
    fn clock_stretch_beyond_budget_times_out() {
        // SCL entry check passes, then the line stays low through every post-pulse poll
        struct StretchyLines(FakeLines);
        impl BusLines for StretchyLines {
            fn scl_is_low(&mut self) -> bool {
                // entry check sees a free clock; every sample after the first pulse is low
                self.0.pulses > 0
            }
            fn sda_is_low(&mut self) -> bool {
                self.0.sda_is_low()
            }
            fn pulse_scl(&mut self) {
                self.0.pulse_scl();
            }
            fn stretch_wait(&mut self) {
                self.0.stretch_wait();
            }
            fn issue_start_stop(&mut self) {
                self.0.issue_start_stop();
            }
        }

        let mut stretchy = StretchyLines(FakeLines::new(0, 5));
        assert_eq!(Err(BusFault::ClockStretchTimeout), clear_bus(&mut stretchy));
        assert_eq!(1, stretchy.0.pulses, "Timeout hits after the first pulse");
        assert_eq!(
            u32::from(STRETCH_POLL_LIMIT),
            stretchy.0.stretch_waits,
            "Every poll interval is consumed before giving up"
        );
        assert_eq!(0, stretchy.0.start_stops);
    }

    #[test]
    fn fault_codes_match_legacy_values() {
        assert_eq!(1, BusFault::ClockHeldLow.code());
        assert_eq!(2, BusFault::ClockStretchTimeout.code());
        assert_eq!(3, BusFault::DataHeldLow.code());
    }
}
