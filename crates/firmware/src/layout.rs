//! Static wiring of this particular console: which expanders sit behind which multiplexer
//! channel, and how their bits map to MIDI.
//!
//! Four key banks (three manuals plus the pedal board) and one bank of piston buttons. The two
//! expander groups reuse I2C addresses 0x20–0x27 and are disambiguated by multiplexer channel.
//! Everything here is built once at startup and never changes.

use crate::expanders::{ConsoleBus, Mcp23017, select_mux_channel};
use embassy_stm32::i2c;
use vox_humana_lib::{
    bits::{MAX_EXPANDERS, PORTS_PER_EXPANDER},
    button_bank::ButtonBank,
    configuration::Tunables,
    console::Console,
    expression::ExpressionPedal,
    key_bank::KeyBank,
};
use wmidi::{Channel, Note};

/// The console type for this hardware: four key banks, one piston bank, two expression pedals.
pub type OrganConsole = Console<4, 1, 2>;

/// Hardware binding of one bank: its multiplexer channel and the expanders to read, in bit order.
pub struct BankWiring {
    mux_channel: u8,
    expanders: &'static [Mcp23017],
}

impl BankWiring {
    /// Puts every expander of the bank into input mode with pull-ups. Called each cycle; the
    /// expanders lose their configuration if the bus glitches, and re-init is cheap.
    pub fn init(&self, bus: &mut ConsoleBus<'_>) -> Result<(), i2c::Error> {
        select_mux_channel(bus, self.mux_channel)?;
        for expander in self.expanders {
            expander.init(bus)?;
        }
        Ok(())
    }

    /// Selects the bank's multiplexer channel and reads every expander's ports, active-high.
    /// Unpopulated trailing entries stay zero.
    pub fn read(
        &self,
        bus: &mut ConsoleBus<'_>,
    ) -> Result<[[u8; PORTS_PER_EXPANDER]; MAX_EXPANDERS], i2c::Error> {
        select_mux_channel(bus, self.mux_channel)?;
        let mut reading = [[0; PORTS_PER_EXPANDER]; MAX_EXPANDERS];
        for (expander, ports) in self.expanders.iter().zip(&mut reading) {
            *ports = expander.read_ports(bus)?;
        }
        Ok(reading)
    }
}

/// Key bank wiring, index-aligned with [`build_console`]'s `manuals`: solo, great, accompaniment,
/// pedal board.
pub static KEY_WIRING: [BankWiring; 4] = [
    BankWiring {
        mux_channel: 0,
        expanders: &[
            Mcp23017::new(0x20),
            Mcp23017::new(0x21),
            Mcp23017::new(0x22),
            Mcp23017::new(0x23),
        ],
    },
    BankWiring {
        mux_channel: 0,
        expanders: &[
            Mcp23017::new(0x24),
            Mcp23017::new(0x25),
            Mcp23017::new(0x26),
            Mcp23017::new(0x27),
        ],
    },
    BankWiring {
        mux_channel: 1,
        expanders: &[
            Mcp23017::new(0x20),
            Mcp23017::new(0x21),
            Mcp23017::new(0x22),
            Mcp23017::new(0x23),
        ],
    },
    BankWiring {
        mux_channel: 1,
        expanders: &[Mcp23017::new(0x24), Mcp23017::new(0x25)],
    },
];

/// Piston bank wiring, index-aligned with `pistons`.
pub static PISTON_WIRING: [BankWiring; 1] = [BankWiring {
    mux_channel: 2,
    expanders: &[Mcp23017::new(0x20), Mcp23017::new(0x21)],
}];

/// Builds the console's owned configuration. Bit 0 of every key bank sounds C2 (MIDI 36); only
/// the great manual carries the sostenuto mechanism.
pub fn build_console(tunables: &Tunables) -> OrganConsole {
    let solo = KeyBank::new(Channel::Ch1, Note::C2, KEY_WIRING[0].expanders.len(), false, tunables);
    let great = KeyBank::new(Channel::Ch2, Note::C2, KEY_WIRING[1].expanders.len(), true, tunables);
    let accomp = KeyBank::new(Channel::Ch3, Note::C2, KEY_WIRING[2].expanders.len(), false, tunables);
    let pedal = KeyBank::new(Channel::Ch4, Note::C2, KEY_WIRING[3].expanders.len(), false, tunables);

    let pistons = ButtonBank::new(Channel::Ch2, PISTON_WIRING[0].expanders.len());

    // both swell shoes read backwards: pressing down lowers the raw value
    let main_swell = ExpressionPedal::new(Channel::Ch1, true);
    let solo_swell = ExpressionPedal::new(Channel::Ch2, true);

    Console::new(
        [solo, great, accomp, pedal],
        [pistons],
        [main_swell, solo_swell],
    )
}
