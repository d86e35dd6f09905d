//! Register-level access to the console's MCP23017 I/O expanders and the TCA9548A bus
//! multiplexer.
//!
//! Each expander exposes two 8-bit ports of key contacts, wired active-low with the chip's
//! internal pull-ups. Expander groups share I2C addresses, so the multiplexer channel for a bank
//! must be selected immediately before any transaction targeting it; no two bank accesses may
//! interleave without an intervening select.

use embassy_stm32::{i2c, mode};

/// The console's shared two-wire bus, reconstructed every scan cycle.
pub type ConsoleBus<'d> = i2c::I2c<'d, mode::Blocking>;

/// Fixed address of the TCA9548A multiplexer.
pub const MUX_ADDRESS: u8 = 0x70;

/// Bus clock; every device on the console supports fast mode.
pub const I2C_CLOCK_HZ: u32 = 400_000;

const IODIRA: u8 = 0x00;
const GPPUA: u8 = 0x0C;
const GPIOA: u8 = 0x12;

/// Routes the bus to one expander group. Channel indices above 7 are a no-op, as on the original
/// console hardware.
pub fn select_mux_channel(bus: &mut ConsoleBus<'_>, channel: u8) -> Result<(), i2c::Error> {
    if channel > 7 {
        return Ok(());
    }
    bus.blocking_write(MUX_ADDRESS, &[1 << channel])
}

/// One MCP23017 behind the multiplexer.
pub struct Mcp23017 {
    address: u8,
}

impl Mcp23017 {
    /// Binds an expander at the given 7-bit address (0x20–0x27).
    pub const fn new(address: u8) -> Self {
        Self { address }
    }

    /// Configures both ports as inputs with pull-ups enabled. The registers are written in the
    /// chip's default sequential-addressing mode, one register pair per transaction.
    pub fn init(&self, bus: &mut ConsoleBus<'_>) -> Result<(), i2c::Error> {
        bus.blocking_write(self.address, &[IODIRA, 0xFF, 0xFF])?;
        bus.blocking_write(self.address, &[GPPUA, 0xFF, 0xFF])
    }

    /// Reads both ports in one transaction and inverts them, so a pressed (grounded) key reads
    /// as 1.
    pub fn read_ports(&self, bus: &mut ConsoleBus<'_>) -> Result<[u8; 2], i2c::Error> {
        let mut raw = [0u8; 2];
        bus.blocking_write_read(self.address, &[GPIOA], &mut raw)?;
        Ok([!raw[0], !raw[1]])
    }
}
