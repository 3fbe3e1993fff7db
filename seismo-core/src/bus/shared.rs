//! Blocking caller surface
//!
//! Thread-context callers and the interrupt handler share one engine
//! through a critical-section mutex. Every blocking wait in the system
//! lives here, and the lock is held only for a single admission attempt
//! or status poll at a time - the interrupt handler is never shut out
//! while a caller spins.

use core::cell::RefCell;

use critical_section::Mutex;
use seismo_hal::i2c::I2cHardware;

use super::{AdmissionError, Completion, I2cError, I2cMaster, Status};
use crate::traits::RegisterBus;

/// Shared handle around the transaction engine
///
/// Place one in a `static`, hand references to every caller, and route
/// the controller's interrupt vector to [`SharedI2c::on_interrupt`].
pub struct SharedI2c<H: I2cHardware> {
    bus: Mutex<RefCell<I2cMaster<H>>>,
}

impl<H: I2cHardware> SharedI2c<H> {
    pub const fn new(master: I2cMaster<H>) -> Self {
        Self {
            bus: Mutex::new(RefCell::new(master)),
        }
    }

    /// Run `f` with the engine locked
    pub fn with<R>(&self, f: impl FnOnce(&mut I2cMaster<H>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.bus.borrow_ref_mut(cs)))
    }

    /// Interrupt entry point; route the controller's vector here
    pub fn on_interrupt(&self) {
        self.with(|bus| bus.on_interrupt());
    }

    /// Engine status
    pub fn status(&self) -> Status {
        self.with(|bus| bus.status())
    }

    /// Why the last transaction ended in [`Status::Error`]
    pub fn fault(&self) -> Option<I2cError> {
        self.with(|bus| bus.fault())
    }

    /// Select the slave device subsequent transactions address
    pub fn select_slave(&self, address: u8) {
        self.with(|bus| bus.select_slave(address));
    }

    /// Copy out the bytes received by the most recent completed read
    pub fn read_result(&self, dest: &mut [u8]) -> usize {
        self.with(|bus| bus.read_result(dest))
    }

    /// Write `value` to `register` on the selected slave
    ///
    /// Retries admission until the engine takes the transaction. With
    /// `wait` the call also blocks until the bus traffic finishes and
    /// reports how it ended; without it the call returns right after
    /// admission and a failure is only visible through [`status`].
    ///
    /// [`status`]: SharedI2c::status
    pub fn write_register(&self, register: u8, value: u8, wait: bool) -> Result<(), I2cError> {
        self.admit(|bus| bus.try_write(register, value, None))?;
        if wait {
            self.wait_idle()?;
        }
        Ok(())
    }

    /// Read `dest.len()` bytes starting at `register`, blocking until
    /// the data has arrived
    pub fn read_register(&self, register: u8, dest: &mut [u8]) -> Result<(), I2cError> {
        self.admit(|bus| bus.try_read(register, dest.len(), None))?;
        self.wait_idle()?;
        self.read_result(dest);
        Ok(())
    }

    /// Start a read of `len` bytes and return immediately
    ///
    /// `completion` fires from interrupt context once the data is
    /// ready; [`read_result`] then yields the bytes. An aborted read
    /// fires no completion and is observed through [`status`].
    ///
    /// [`read_result`]: SharedI2c::read_result
    /// [`status`]: SharedI2c::status
    pub fn read_register_async(
        &self,
        register: u8,
        len: usize,
        completion: Completion,
    ) -> Result<(), I2cError> {
        self.admit(|bus| bus.try_read(register, len, Some(completion)))
    }

    /// Spin until the engine takes the transaction
    ///
    /// Busy and start-time arbitration loss both mean "attempt the
    /// whole transaction again"; an invalid length can never succeed
    /// and is surfaced instead.
    fn admit(
        &self,
        mut attempt: impl FnMut(&mut I2cMaster<H>) -> Result<(), AdmissionError>,
    ) -> Result<(), I2cError> {
        loop {
            match self.with(&mut attempt) {
                Ok(()) => return Ok(()),
                Err(AdmissionError::InvalidLength) => return Err(I2cError::InvalidLength),
                Err(AdmissionError::Busy) | Err(AdmissionError::ArbitrationLost) => {
                    core::hint::spin_loop();
                }
            }
        }
    }

    /// Spin until the in-flight transaction terminates
    fn wait_idle(&self) -> Result<(), I2cError> {
        loop {
            match self.status() {
                Status::Busy => core::hint::spin_loop(),
                Status::Available => return Ok(()),
                Status::Error => {
                    return Err(self.fault().unwrap_or(I2cError::ArbitrationLost));
                }
            }
        }
    }
}

impl<H: I2cHardware> RegisterBus for &SharedI2c<H> {
    fn select(&mut self, address: u8) {
        SharedI2c::select_slave(*self, address);
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), I2cError> {
        SharedI2c::write_register(*self, register, value, true)
    }

    fn read_registers(&mut self, register: u8, dest: &mut [u8]) -> Result<(), I2cError> {
        SharedI2c::read_register(*self, register, dest)
    }
}
