//! I2C0 master controller
//!
//! Maps the MK70F12 I2C0 register block onto the `I2cHardware` trait.
//! The controller raises one interrupt per byte-level bus event; all
//! sequencing lives in `seismo-core`, this module only moves bits.

use core::sync::atomic::{AtomicBool, Ordering};

use seismo_hal::i2c::{Divider, EventFlags, I2cHardware};

// I2C0 register block (base 0x4006_6000)
const I2C0_F: *mut u8 = 0x4006_6001 as *mut u8;
const I2C0_C1: *mut u8 = 0x4006_6002 as *mut u8;
const I2C0_S: *mut u8 = 0x4006_6003 as *mut u8;
const I2C0_D: *mut u8 = 0x4006_6004 as *mut u8;

// C1 bits
const C1_IICEN: u8 = 0x80;
const C1_IICIE: u8 = 0x40;
const C1_MST: u8 = 0x20;
const C1_TX: u8 = 0x10;
const C1_TXAK: u8 = 0x08;
const C1_RSTA: u8 = 0x04;

// S bits; IICIF and ARBL are write-1-to-clear
const S_BUSY: u8 = 0x20;
const S_ARBL: u8 = 0x10;
const S_IICIF: u8 = 0x02;
const S_RXAK: u8 = 0x01;

// Clock gates and pin control
const SIM_SCGC4: *mut u32 = 0x4004_8034 as *mut u32;
const SIM_SCGC5: *mut u32 = 0x4004_8038 as *mut u32;
const SCGC4_IIC0: u32 = 1 << 6;
const SCGC5_PORTE: u32 = 1 << 13;

const PORTE_PCR18: *mut u32 = 0x4004_D048 as *mut u32;
const PORTE_PCR19: *mut u32 = 0x4004_D04C as *mut u32;
/// ALT4 (I2C0 function) with open drain, as the bus requires
const PCR_I2C_OPEN_DRAIN: u32 = (0x4 << 8) | (1 << 5);

static TAKEN: AtomicBool = AtomicBool::new(false);

/// The I2C0 controller
///
/// Owning an instance is the permission to touch the I2C0 registers.
pub struct I2c0 {
    _private: (),
}

impl I2c0 {
    /// Take the controller; returns `None` after the first call
    pub fn take() -> Option<Self> {
        if TAKEN.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(I2c0 { _private: () })
    }

    /// Conjure the controller out of thin air
    ///
    /// # Safety
    ///
    /// The caller must guarantee no other instance exists. Intended for
    /// `static` initializers, where [`I2c0::take`] is not available.
    pub const unsafe fn steal() -> Self {
        I2c0 { _private: () }
    }

    /// Gate the module and port clocks and mux PTE18/PTE19 for I2C0
    pub fn init_pins(&mut self) {
        unsafe {
            SIM_SCGC4.write_volatile(SIM_SCGC4.read_volatile() | SCGC4_IIC0);
            SIM_SCGC5.write_volatile(SIM_SCGC5.read_volatile() | SCGC5_PORTE);
            PORTE_PCR18.write_volatile(PCR_I2C_OPEN_DRAIN);
            PORTE_PCR19.write_volatile(PCR_I2C_OPEN_DRAIN);
        }
    }

    fn modify_c1(&mut self, f: impl FnOnce(u8) -> u8) {
        unsafe {
            I2C0_C1.write_volatile(f(I2C0_C1.read_volatile()));
        }
    }
}

impl I2cHardware for I2c0 {
    fn set_divider(&mut self, divider: Divider) {
        unsafe {
            I2C0_F.write_volatile((divider.multiplier.code() << 6) | divider.icr);
        }
    }

    fn enable(&mut self) {
        self.modify_c1(|c1| c1 | C1_IICEN);
    }

    fn bus_busy(&self) -> bool {
        unsafe { I2C0_S.read_volatile() } & S_BUSY != 0
    }

    fn event_flags(&self) -> EventFlags {
        let status = unsafe { I2C0_S.read_volatile() };
        EventFlags {
            pending: status & S_IICIF != 0,
            arbitration_lost: status & S_ARBL != 0,
            nacked: status & S_RXAK != 0,
        }
    }

    fn clear_event(&mut self) {
        unsafe {
            I2C0_S.write_volatile(S_IICIF);
        }
    }

    fn clear_arbitration_loss(&mut self) {
        unsafe {
            I2C0_S.write_volatile(S_ARBL);
        }
    }

    fn enable_interrupt(&mut self) {
        self.modify_c1(|c1| c1 | C1_IICIE);
    }

    fn disable_interrupt(&mut self) {
        self.modify_c1(|c1| c1 & !C1_IICIE);
    }

    fn start(&mut self) {
        // Raising MST while in transmit asserts START on the wire.
        self.modify_c1(|c1| c1 | C1_TX | C1_MST);
    }

    fn repeated_start(&mut self) {
        self.modify_c1(|c1| c1 | C1_RSTA | C1_TX);
    }

    fn stop(&mut self) {
        // Dropping MST generates STOP; TXAK is re-armed for the next
        // transaction's receives.
        self.modify_c1(|c1| c1 & !(C1_MST | C1_TXAK));
    }

    fn release(&mut self) {
        self.modify_c1(|c1| c1 & !(C1_MST | C1_TX));
    }

    fn set_transmit(&mut self) {
        self.modify_c1(|c1| c1 | C1_TX);
    }

    fn set_receive(&mut self) {
        self.modify_c1(|c1| c1 & !C1_TX);
    }

    fn ack_next(&mut self) {
        self.modify_c1(|c1| c1 & !C1_TXAK);
    }

    fn nack_next(&mut self) {
        self.modify_c1(|c1| c1 | C1_TXAK);
    }

    fn write_data(&mut self, byte: u8) {
        unsafe {
            I2C0_D.write_volatile(byte);
        }
    }

    fn read_data(&mut self) -> u8 {
        unsafe { I2C0_D.read_volatile() }
    }
}
