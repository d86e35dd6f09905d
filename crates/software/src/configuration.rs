//! Tunable constants of the scan engine, gathered in one place so the firmware can adjust them for
//! different console hardware without touching the engine itself.

use embassy_time::Duration;
use wmidi::{U7, Velocity};

/// Settings every scan stage reads but never writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tunables {
    /// Velocity attached to every NoteOn/NoteOff; the key contacts carry no timing information,
    /// so velocity is fixed.
    pub velocity: Velocity,
    /// Minimum settle time between accepted toggles of a single key contact.
    pub debounce_window: Duration,
    /// An expression-pedal sample must differ from the last transmitted raw reading by more than
    /// this many ADC counts before a Control Change is sent.
    pub expression_threshold: u16,
    /// ADC resolution in bits. 12 on the standard build; 10 on reduced hardware.
    pub adc_resolution_bits: u8,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            velocity: U7::from_u8_lossy(64),
            debounce_window: Duration::from_micros(50_000),
            expression_threshold: 63,
            adc_resolution_bits: 12,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let tunables = Tunables::default();
        assert_eq!(U7::from_u8_lossy(64), tunables.velocity);
        assert_eq!(Duration::from_micros(50_000), tunables.debounce_window);
        assert_eq!(63, tunables.expression_threshold);
        assert_eq!(12, tunables.adc_resolution_bits);
    }
}
