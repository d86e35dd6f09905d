//! This crate contains the architecture-agnostic logic for Vox Humana, a MIDI encoder for a
//! multi-manual electronic organ console. The firmware polls banks of I/O expander chips (one bit
//! per key or piston) over a shared two-wire bus and turns logical transitions into a
//! [MIDI](https://midi.org/midi-1-0) event stream.
//!
//! Everything with real state, timing, or failure handling lives here so it can be exercised on
//! the host: per-bit debouncing, the sostenuto latch, edge detection, expression-pedal hysteresis,
//! and the bus-recovery state machine. The hardware crate contributes only thin collaborators:
//! raw port reads, multiplexer channel selection, ADC sampling, and the USB-MIDI transport.

#![deny(missing_docs)]
#![no_std]

/// The timekeeping crate backing every timestamp this library takes. Re-exported so that a
/// caller pinned to a different embassy-time major can still name the exact [`Instant`] and
/// [`Duration`] types the scan APIs expect.
///
/// [`Instant`]: embassy_time::Instant
/// [`Duration`]: embassy_time::Duration
pub use embassy_time;

pub mod bits;
pub mod bus_clear;
pub mod button_bank;
pub mod configuration;
pub mod console;
pub mod debounce;
pub mod expression;
pub mod key_bank;
pub mod sostenuto;
pub mod usb_midi;
