//! Open-drain line driver for bus recovery.
//!
//! While the I2C peripheral is detached (the driver is dropped at the end of every scan cycle),
//! the clock and data pins are borrowed back as flexible GPIOs so the recovery state machine can
//! observe and manually clock the bus. Neither line is ever driven high: released means input
//! with pull-up, exactly as the open-collector bus requires.

use embassy_stm32::gpio::{Flex, Pull, Speed};
use embassy_time::{Duration, block_for};
use vox_humana_lib::bus_clear::BusLines;

/// Half-period of a manual recovery clock; >5 µs so even the slowest slaves see it.
const PULSE_HALF_PERIOD: Duration = Duration::from_micros(10);

/// Poll interval while waiting out a clock-stretching slave.
const STRETCH_POLL: Duration = Duration::from_millis(100);

/// [`BusLines`] over the bus pins as flexible GPIOs.
pub struct RecoveryLines<'d> {
    scl: Flex<'d>,
    sda: Flex<'d>,
}

impl<'d> RecoveryLines<'d> {
    /// Takes over the bus pins, releasing both lines with pull-ups enabled.
    pub fn new(mut scl: Flex<'d>, mut sda: Flex<'d>) -> Self {
        scl.set_as_input(Pull::Up);
        sda.set_as_input(Pull::Up);
        Self { scl, sda }
    }

    fn drive_low(line: &mut Flex<'d>) {
        line.set_low();
        line.set_as_output(Speed::Low);
    }

    fn release(line: &mut Flex<'d>) {
        line.set_as_input(Pull::Up);
    }
}

impl BusLines for RecoveryLines<'_> {
    fn scl_is_low(&mut self) -> bool {
        self.scl.is_low()
    }

    fn sda_is_low(&mut self) -> bool {
        self.sda.is_low()
    }

    fn pulse_scl(&mut self) {
        Self::drive_low(&mut self.scl);
        block_for(PULSE_HALF_PERIOD);
        Self::release(&mut self.scl);
        block_for(PULSE_HALF_PERIOD);
    }

    fn stretch_wait(&mut self) {
        block_for(STRETCH_POLL);
    }

    fn issue_start_stop(&mut self) {
        // with a single master, a start followed by a stop resets every slave's bus engine
        Self::drive_low(&mut self.sda);
        block_for(PULSE_HALF_PERIOD);
        Self::release(&mut self.sda);
        block_for(PULSE_HALF_PERIOD);
    }
}
