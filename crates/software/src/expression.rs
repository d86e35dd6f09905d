//! Expression-pedal sampling with hysteresis.
//!
//! Swell shoes are potentiometers read by the ADC. Raw readings jitter by a few counts, so a
//! sample must move past a threshold from the last *transmitted* raw value before a new Control
//! Change goes out; the raw reading, not the scaled MIDI value, is the comparison baseline.

use crate::configuration::Tunables;
use wmidi::{Channel, ControlFunction, MidiMessage, U7};

/// One continuous pedal mapped to Control Change 7 (volume) on its channel.
pub struct ExpressionPedal {
    channel: Channel,
    /// Pedals wired so that pressing down lowers the raw reading report `127 - scaled`
    /// instead of `scaled`.
    invert: bool,
    /// Raw ADC value behind the last transmitted Control Change; `None` until the first sample,
    /// which therefore always transmits.
    last_raw: Option<u16>,
}

impl ExpressionPedal {
    /// Constructs a pedal that has not yet transmitted.
    pub const fn new(channel: Channel, invert: bool) -> Self {
        Self {
            channel,
            invert,
            last_raw: None,
        }
    }

    /// Considers one raw ADC sample.
    ///
    /// Returns a volume Control Change when the sample clears the hysteresis threshold, rescaled
    /// from the ADC range to 0–127 and inverted if configured. Otherwise returns `None` and the
    /// baseline is left untouched.
    pub fn sample(&mut self, raw: u16, tunables: &Tunables) -> Option<MidiMessage<'static>> {
        if let Some(last) = self.last_raw {
            let delta = (i32::from(raw) - i32::from(last)).unsigned_abs();
            if delta <= u32::from(tunables.expression_threshold) {
                return None;
            }
        }

        let scaled = ((u32::from(raw) * 128) >> tunables.adc_resolution_bits).min(127) as u8;
        let value = if self.invert { 127 - scaled } else { scaled };
        self.last_raw = Some(raw);

        Some(MidiMessage::ControlChange(
            self.channel,
            ControlFunction::CHANNEL_VOLUME,
            U7::from_u8_lossy(value),
        ))
    }
}
