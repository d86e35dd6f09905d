//! The scan engine for one key bank (a keyboard manual or the pedal board).
//!
//! Per cycle the firmware hands the engine the freshly read port bytes of every expander in the
//! bank, already inverted so a pressed key reads as 1. The engine ORs in the sostenuto latch,
//! debounces, diffs against the previous cycle, and emits exactly one NoteOn/NoteOff per logical
//! transition.

use crate::{
    bits::{BitArray, MAX_EXPANDERS, PORTS_PER_EXPANDER, bit_index},
    configuration::Tunables,
    debounce::DebounceFilter,
    sostenuto::SostenutoPedal,
};
use embassy_time::Instant;
use wmidi::{Channel, MidiMessage, Note, U7, Velocity};

/// State and static configuration of one scanned key bank.
///
/// Bit `i` of port byte `b` is physical key `b * 8 + i` and sounds MIDI pitch
/// `lowest_note + b * 8 + i` on the bank's channel.
pub struct KeyBank {
    channel: Channel,
    lowest_note: u8,
    expander_cnt: usize,
    previous: BitArray,
    current: BitArray,
    sostenuto_latch: BitArray,
    debounce: DebounceFilter,
    sostenuto_enabled: bool,
    velocity: Velocity,
}

impl KeyBank {
    /// Constructs a bank of `expander_cnt` chips (at most [`MAX_EXPANDERS`]) with all keys up.
    pub fn new(
        channel: Channel,
        lowest_note: Note,
        expander_cnt: usize,
        sostenuto_enabled: bool,
        tunables: &Tunables,
    ) -> Self {
        Self {
            channel,
            lowest_note: lowest_note as u8,
            expander_cnt: expander_cnt.min(MAX_EXPANDERS),
            previous: BitArray::new(),
            current: BitArray::new(),
            sostenuto_latch: BitArray::new(),
            debounce: DebounceFilter::new(tunables.debounce_window),
            sostenuto_enabled,
            velocity: tunables.velocity,
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

    /// Whether the key at the given global index is sounding as of the last scan (physically
    /// held or latched).
    pub fn key_is_down(&self, key: usize) -> bool {
        self.current.get(key)
    }

    /// Drops every latched key. Called when the sostenuto pedal is released, before the cycle's
    /// scan, so the edge detector emits the deferred NoteOffs.
    pub(crate) fn clear_latch(&mut self) {
        self.sostenuto_latch.clear();
    }

    /// Processes one cycle's reading for this bank.
    ///
    /// `reading[j]` holds the two port bytes of expander `j`, active-high. `now` is sampled once
    /// per cycle by the caller. Emits one message per changed bit, then promotes the corrected
    /// reading to `previous` for the next cycle. While the pedal's down edge is visible, the
    /// corrected reading is also captured into the sostenuto latch, freezing exactly the keys
    /// sounding at the instant of engagement.
    pub fn scan(
        &mut self,
        reading: &[[u8; PORTS_PER_EXPANDER]],
        now: Instant,
        pedal: &SostenutoPedal,
        emit: &mut impl FnMut(MidiMessage<'static>),
    ) {
        for (chip, ports) in reading.iter().enumerate().take(self.expander_cnt) {
            for (half, &raw) in ports.iter().enumerate() {
                let byte = chip * PORTS_PER_EXPANDER + half;

                let mut value = raw;
                if self.sostenuto_enabled {
                    // the latch is all-zero while the pedal is up, so the OR is unconditional
                    value |= self.sostenuto_latch.byte(byte);
                }

                let previous = self.previous.byte(byte);
                let value = self.debounce.filter(byte, previous, value, now);

                let changed = value ^ previous;
                for bit in 0..8 {
                    if changed >> bit & 1 == 0 {
                        continue;
                    }
                    let pitch = self.lowest_note + bit_index(byte, bit) as u8;
                    let note = Note::from(U7::from_u8_lossy(pitch));
                    emit(if value >> bit & 1 == 1 {
                        MidiMessage::NoteOn(self.channel, note, self.velocity)
                    } else {
                        MidiMessage::NoteOff(self.channel, note, self.velocity)
                    });
                }

                self.current.set_byte(byte, value);
                self.previous.set_byte(byte, value);

                if self.sostenuto_enabled && pedal.just_engaged() {
                    self.sostenuto_latch.set_byte(byte, value);
                }
            }
        }
    }
}
