//! The console: one owned value holding every bank and the sostenuto pedal.
//!
//! The firmware's loop is the single writer. Each cycle it brackets the bank scans with
//! [`Console::begin_cycle`] and [`Console::end_cycle`]; everything in between mutates exactly one
//! bank at a time through the public arrays.

use crate::{
    button_bank::ButtonBank, expression::ExpressionPedal, key_bank::KeyBank,
    sostenuto::SostenutoPedal,
};

/// Static configuration and scan state for the whole console: `K` key banks (manuals and pedal
/// board), `B` piston banks, `E` expression pedals.
pub struct Console<const K: usize, const B: usize, const E: usize> {
    /// Key banks, scanned in order every cycle.
    pub manuals: [KeyBank; K],
    /// Piston banks.
    pub pistons: [ButtonBank; B],
    /// Expression pedals.
    pub expression: [ExpressionPedal; E],
    sostenuto: SostenutoPedal,
}

impl<const K: usize, const B: usize, const E: usize> Console<K, B, E> {
    /// Assembles a console from banks built at startup. Nothing is ever added or removed later;
    /// only scan state mutates.
    pub fn new(
        manuals: [KeyBank; K],
        pistons: [ButtonBank; B],
        expression: [ExpressionPedal; E],
    ) -> Self {
        Self {
            manuals,
            pistons,
            expression,
            sostenuto: SostenutoPedal::new(),
        }
    }

    /// Feeds this cycle's sostenuto pedal sample in. On the pedal's up edge every manual's latch
    /// is cleared before any scanning, so this cycle's edge detection emits the deferred
    /// NoteOffs for latched keys that are no longer physically held.
    pub fn begin_cycle(&mut self, sostenuto_engaged: bool) {
        self.sostenuto.set_engaged(sostenuto_engaged);
        if self.sostenuto.just_released() {
            for bank in &mut self.manuals {
                bank.clear_latch();
            }
        }
    }

    /// Copy of the pedal edge state to pass into [`KeyBank::scan`].
    pub fn sostenuto(&self) -> SostenutoPedal {
        self.sostenuto
    }

    /// Promotes this cycle's pedal state to history. Call after every stage has run.
    pub fn end_cycle(&mut self) {
        self.sostenuto.record();
    }
}
