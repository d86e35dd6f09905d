//! Scan and edge detection for piston buttons.
//!
//! Pistons are momentary switches wired like a key bank but carry no musical state: no debounce
//! (registration changes are deliberate, slow gestures) and no sostenuto. A Program Change can
//! carry only one data byte, so press and release share the value space: a release is the
//! button's index plus a fixed offset.

use crate::bits::{BitArray, MAX_EXPANDERS, PORTS_PER_EXPANDER, bit_index};
use wmidi::{Channel, MidiMessage, U7};

/// Program Change value offset distinguishing a release from a press of the same button.
pub const RELEASE_OFFSET: u8 = 64;

/// State and static configuration of one piston bank.
pub struct ButtonBank {
    channel: Channel,
    expander_cnt: usize,
    previous: BitArray,
    current: BitArray,
}

impl ButtonBank {
    /// Constructs a bank of `expander_cnt` chips (at most [`MAX_EXPANDERS`]) with all buttons up.
    pub fn new(channel: Channel, expander_cnt: usize) -> Self {
        Self {
            channel,
            expander_cnt: expander_cnt.min(MAX_EXPANDERS),
            previous: BitArray::new(),
            current: BitArray::new(),
        }
    }

    /// Number of expander chips the firmware must read for this bank.
    pub fn expander_cnt(&self) -> usize {
        self.expander_cnt
    }

    /// The bank's MIDI channel.
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Whether the button at the given global index was down as of the last scan.
    pub fn button_is_down(&self, button: usize) -> bool {
        self.current.get(button)
    }

    /// Processes one cycle's reading, emitting a Program Change per changed bit: the global
    /// button index for a press, the index plus [`RELEASE_OFFSET`] for a release. Values are
    /// masked to 0–127.
    pub fn scan(
        &mut self,
        reading: &[[u8; PORTS_PER_EXPANDER]],
        emit: &mut impl FnMut(MidiMessage<'static>),
    ) {
        for (chip, ports) in reading.iter().enumerate().take(self.expander_cnt) {
            for (half, &value) in ports.iter().enumerate() {
                let byte = chip * PORTS_PER_EXPANDER + half;
                let changed = value ^ self.previous.byte(byte);

                for bit in 0..8 {
                    if changed >> bit & 1 == 0 {
                        continue;
                    }
                    let index = bit_index(byte, bit) as u8;
                    let program = if value >> bit & 1 == 1 {
                        index
                    } else {
                        index + RELEASE_OFFSET
                    };
                    emit(MidiMessage::ProgramChange(
                        self.channel,
                        U7::from_u8_lossy(program),
                    ));
                }

                self.current.set_byte(byte, value);
                self.previous.set_byte(byte, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    extern crate std;
    use std::vec::Vec;

    fn collect(bank: &mut ButtonBank, reading: &[[u8; 2]]) -> Vec<MidiMessage<'static>> {
        let mut events = Vec::new();
        bank.scan(reading, &mut |msg| events.push(msg));
        events
    }

    #[test]
    fn press_sends_button_index() {
        let mut bank = ButtonBank::new(Channel::Ch2, 2);

        // chip 0, port A, bit 5: global index 5
        let events = collect(&mut bank, &[[0b0010_0000, 0], [0, 0]]);
        assert_eq!(
            Vec::from([MidiMessage::ProgramChange(
                Channel::Ch2,
                U7::from_u8_lossy(5)
            )]),
            events,
            "Expected left but got right"
        );
    }

    #[test]
    fn release_sends_index_plus_offset() {
        let mut bank = ButtonBank::new(Channel::Ch2, 2);
        collect(&mut bank, &[[0b0010_0000, 0], [0, 0]]);

        let events = collect(&mut bank, &[[0, 0], [0, 0]]);
        assert_eq!(
            Vec::from([MidiMessage::ProgramChange(
                Channel::Ch2,
                U7::from_u8_lossy(69)
            )]),
            events,
            "Expected left but got right"
        );
    }

    #[test]
    fn second_chip_offsets_by_sixteen() {
        let mut bank = ButtonBank::new(Channel::Ch2, 2);

        // chip 1, port B, bit 0: global index 1*16 + 8 = 24
        let events = collect(&mut bank, &[[0, 0], [0, 0b0000_0001]]);
        assert_eq!(
            Vec::from([MidiMessage::ProgramChange(
                Channel::Ch2,
                U7::from_u8_lossy(24)
            )]),
            events,
            "Expected left but got right"
        );
    }

    #[test]
    fn held_button_is_silent() {
        let mut bank = ButtonBank::new(Channel::Ch2, 1);
        collect(&mut bank, &[[0b0000_0001, 0]]);
        let events = collect(&mut bank, &[[0b0000_0001, 0]]);
        assert!(events.is_empty(), "Steady state is not a transition");
        assert!(bank.button_is_down(0));
        assert!(!bank.button_is_down(1));
    }
}
