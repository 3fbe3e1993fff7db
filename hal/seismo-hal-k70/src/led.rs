//! Tower board LEDs
//!
//! Four LEDs on PTA10/11/28/29, wired active-low. Exposed through the
//! embedded-hal digital traits so the application stays board-agnostic.

use core::convert::Infallible;
use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::digital::{ErrorType, OutputPin, StatefulOutputPin};

const SIM_SCGC5: *mut u32 = 0x4004_8038 as *mut u32;
const SCGC5_PORTA: u32 = 1 << 9;

const PORTA_PCR_BASE: *mut u32 = 0x4004_9000 as *mut u32;
const PCR_MUX_GPIO: u32 = 0x1 << 8;

const GPIOA_PDOR: *mut u32 = 0x400F_F000 as *mut u32;
const GPIOA_PSOR: *mut u32 = 0x400F_F004 as *mut u32;
const GPIOA_PCOR: *mut u32 = 0x400F_F008 as *mut u32;
const GPIOA_PTOR: *mut u32 = 0x400F_F00C as *mut u32;
const GPIOA_PDDR: *mut u32 = 0x400F_F014 as *mut u32;

const ORANGE_PIN: u8 = 11;
const YELLOW_PIN: u8 = 28;
const GREEN_PIN: u8 = 29;
const BLUE_PIN: u8 = 10;

static TAKEN: AtomicBool = AtomicBool::new(false);

/// One board LED as an output pin
///
/// The pin drives the cathode: setting it low lights the LED.
pub struct Led {
    mask: u32,
}

impl Led {
    fn init(pin: u8) -> Self {
        let mask = 1u32 << pin;
        unsafe {
            PORTA_PCR_BASE.add(pin as usize).write_volatile(PCR_MUX_GPIO);
            GPIOA_PDDR.write_volatile(GPIOA_PDDR.read_volatile() | mask);
            // Off until someone asks otherwise.
            GPIOA_PSOR.write_volatile(mask);
        }
        Self { mask }
    }

    pub fn on(&mut self) {
        unsafe {
            GPIOA_PCOR.write_volatile(self.mask);
        }
    }

    pub fn off(&mut self) {
        unsafe {
            GPIOA_PSOR.write_volatile(self.mask);
        }
    }
}

impl ErrorType for Led {
    type Error = Infallible;
}

impl OutputPin for Led {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.on();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.off();
        Ok(())
    }
}

impl StatefulOutputPin for Led {
    fn is_set_high(&mut self) -> Result<bool, Infallible> {
        Ok(unsafe { GPIOA_PDOR.read_volatile() } & self.mask != 0)
    }

    fn is_set_low(&mut self) -> Result<bool, Infallible> {
        Ok(unsafe { GPIOA_PDOR.read_volatile() } & self.mask == 0)
    }

    fn toggle(&mut self) -> Result<(), Infallible> {
        unsafe {
            GPIOA_PTOR.write_volatile(self.mask);
        }
        Ok(())
    }
}

/// All four board LEDs
pub struct Leds {
    pub orange: Led,
    pub yellow: Led,
    pub green: Led,
    pub blue: Led,
}

impl Leds {
    /// Claim and initialize the LEDs; returns `None` after the first
    /// call
    pub fn take() -> Option<Leds> {
        if TAKEN.swap(true, Ordering::AcqRel) {
            return None;
        }
        unsafe {
            SIM_SCGC5.write_volatile(SIM_SCGC5.read_volatile() | SCGC5_PORTA);
        }
        Some(Leds {
            orange: Led::init(ORANGE_PIN),
            yellow: Led::init(YELLOW_PIN),
            green: Led::init(GREEN_PIN),
            blue: Led::init(BLUE_PIN),
        })
    }
}
