//! Edge state for the sostenuto pedal.
//!
//! The pedal is a single digital input sampled once per cycle. Latch capture and release both key
//! off its transitions, so the previous cycle's state is carried alongside the current one.

/// Current and previous engagement state of the sostenuto pedal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SostenutoPedal {
    engaged: bool,
    was_engaged: bool,
}

impl SostenutoPedal {
    /// Constructs a released pedal with no history.
    pub const fn new() -> Self {
        Self {
            engaged: false,
            was_engaged: false,
        }
    }

    /// Stores this cycle's sampled engagement state.
    pub fn set_engaged(&mut self, engaged: bool) {
        self.engaged = engaged;
    }

    /// Whether the pedal is down this cycle.
    pub fn engaged(&self) -> bool {
        self.engaged
    }

    /// Whether the pedal went down between the previous cycle and this one.
    pub fn just_engaged(&self) -> bool {
        self.engaged && !self.was_engaged
    }

    /// Whether the pedal came up between the previous cycle and this one.
    pub fn just_released(&self) -> bool {
        !self.engaged && self.was_engaged
    }

    /// Promotes this cycle's state to history. Call once at the end of every cycle.
    pub fn record(&mut self) {
        self.was_engaged = self.engaged;
    }
}
