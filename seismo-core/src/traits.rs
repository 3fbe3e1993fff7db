//! Caller-facing traits
//!
//! Device drivers talk to the bus through [`RegisterBus`] rather than
//! the engine type itself, so a driver can be exercised against a fake
//! register map on the host.

use crate::bus::I2cError;

/// Register-level access to a device behind an I2C master
pub trait RegisterBus {
    /// Select the slave device subsequent calls address
    fn select(&mut self, address: u8);

    /// Write one byte to a device register
    fn write_register(&mut self, register: u8, value: u8) -> Result<(), I2cError>;

    /// Fill `dest` from consecutive registers starting at `register`
    fn read_registers(&mut self, register: u8, dest: &mut [u8]) -> Result<(), I2cError>;

    /// Read a single register
    fn read_register(&mut self, register: u8) -> Result<u8, I2cError> {
        let mut byte = [0u8; 1];
        self.read_registers(register, &mut byte)?;
        Ok(byte[0])
    }
}
