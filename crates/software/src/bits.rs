//! Fixed-size bit arrays for bank state.
//!
//! Each expander chip contributes two 8-bit ports, so a fully populated bank is 8 bytes / 64 bits.
//! The `previous`, `current`, and sostenuto-latch images of a bank are all [`BitArray`]s of the
//! same active length, and bit `i` of byte `b` always addresses physical key `b * 8 + i`.

/// Maximum number of expander chips a single bank may use.
pub const MAX_EXPANDERS: usize = 4;

/// Ports (8-bit each) per expander chip.
pub const PORTS_PER_EXPANDER: usize = 2;

/// Bytes of switch state in a fully populated bank.
pub const BANK_BYTES: usize = MAX_EXPANDERS * PORTS_PER_EXPANDER;

/// Bits of switch state in a fully populated bank.
pub const BANK_BITS: usize = BANK_BYTES * 8;

/// Maps a byte index and a bit position within that byte to a global key index.
pub const fn bit_index(byte: usize, bit: usize) -> usize {
    byte * 8 + bit
}

/// One bit per physical switch, stored port-byte by port-byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BitArray {
    bytes: [u8; BANK_BYTES],
}

impl BitArray {
    /// Constructs an all-zero `BitArray`.
    pub const fn new() -> Self {
        Self {
            bytes: [0; BANK_BYTES],
        }
    }

    /// Returns the port byte at `index`.
    pub fn byte(&self, index: usize) -> u8 {
        self.bytes[index]
    }

    /// Replaces the port byte at `index`.
    pub fn set_byte(&mut self, index: usize, value: u8) {
        self.bytes[index] = value;
    }

    /// Returns the bit for the given global key index.
    pub fn get(&self, index: usize) -> bool {
        self.bytes[index / 8] >> (index % 8) & 1 == 1
    }

    /// Sets or clears the bit for the given global key index.
    pub fn set(&mut self, index: usize, value: bool) {
        let mask = 1 << (index % 8);
        if value {
            self.bytes[index / 8] |= mask;
        } else {
            self.bytes[index / 8] &= !mask;
        }
    }

    /// Zeroes every bit.
    pub fn clear(&mut self) {
        self.bytes = [0; BANK_BYTES];
    }
}
