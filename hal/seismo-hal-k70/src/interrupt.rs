//! Interrupt numbers for the vectors this firmware uses

use cortex_m::interrupt::InterruptNumber;

/// K70 interrupt request numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Irq {
    /// I2C0 byte-event interrupt
    I2c0 = 24,
}

// SAFETY: the discriminants above are the IRQ numbers from the K70
// vector table.
unsafe impl InterruptNumber for Irq {
    fn number(self) -> u16 {
        self as u16
    }
}
