//! MMA8451Q 3-axis accelerometer
//!
//! The sensor sits behind the I2C transaction engine and is driven
//! entirely through register reads and writes. In fast-read mode the
//! device serves one byte per axis, so a whole sample is a 3-byte burst
//! from `OUT_X_MSB`.

use seismo_core::bus::I2cError;
use seismo_core::traits::RegisterBus;

/// Device register map
mod reg {
    pub const STATUS: u8 = 0x00;
    pub const OUT_X_MSB: u8 = 0x01;
    pub const INT_SOURCE: u8 = 0x0C;
    pub const WHO_AM_I: u8 = 0x0D;
    pub const CTRL_REG1: u8 = 0x2A;
    pub const CTRL_REG2: u8 = 0x2B;
    pub const CTRL_REG4: u8 = 0x2D;
    pub const CTRL_REG5: u8 = 0x2E;
}

/// Value WHO_AM_I reads back on a genuine MMA8451Q
const WHO_AM_I_ID: u8 = 0x1A;

const STATUS_ZYXDR: u8 = 0x08;

const CTRL1_ACTIVE: u8 = 0x01;
const CTRL1_F_READ: u8 = 0x02;
const CTRL1_LNOISE: u8 = 0x04;
/// Output data rate field set to 1.56 Hz
const CTRL1_DR_1_56HZ: u8 = 0x38;

const CTRL2_RST: u8 = 0x40;

const CTRL4_INT_EN_DRDY: u8 = 0x01;
const CTRL5_INT_CFG_DRDY: u8 = 0x01;

/// 7-bit slave address, selected by the SA0 strap pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sa0 {
    /// SA0 tied low: address 0x1C
    Low,
    /// SA0 tied high: address 0x1D
    High,
}

impl Sa0 {
    const fn address(self) -> u8 {
        match self {
            Sa0::Low => 0x1C,
            Sa0::High => 0x1D,
        }
    }
}

/// How new-sample availability is signalled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccelMode {
    /// Caller polls [`Mma8451q::data_ready`]
    Polling,
    /// Device raises its INT1 line when a sample is ready
    DataReadyInterrupt,
}

/// Errors from the accelerometer driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccelError {
    /// The device at the selected address is not an MMA8451Q
    WrongDevice {
        /// What WHO_AM_I actually read back
        found: u8,
    },
    /// The bus transaction failed
    Bus(I2cError),
}

impl From<I2cError> for AccelError {
    fn from(error: I2cError) -> Self {
        AccelError::Bus(error)
    }
}

/// MMA8451Q driver over a register bus
pub struct Mma8451q<B: RegisterBus> {
    bus: B,
    address: u8,
    mode: AccelMode,
}

impl<B: RegisterBus> Mma8451q<B> {
    pub fn new(bus: B, sa0: Sa0) -> Self {
        Self {
            bus,
            address: sa0.address(),
            mode: AccelMode::Polling,
        }
    }

    /// Probe, reset and configure the device
    ///
    /// Verifies WHO_AM_I before touching anything else, soft-resets,
    /// and brings the device up active at 1.56 Hz with fast read and
    /// the low-noise path enabled.
    pub fn init(&mut self) -> Result<(), AccelError> {
        self.bus.select(self.address);

        let found = self.bus.read_register(reg::WHO_AM_I)?;
        if found != WHO_AM_I_ID {
            return Err(AccelError::WrongDevice { found });
        }

        // Soft reset; RST reads back as set until the device has
        // finished rebooting.
        self.bus.write_register(reg::CTRL_REG2, CTRL2_RST)?;
        while self.bus.read_register(reg::CTRL_REG2)? & CTRL2_RST != 0 {}

        self.bus.write_register(
            reg::CTRL_REG1,
            CTRL1_DR_1_56HZ | CTRL1_ACTIVE | CTRL1_F_READ | CTRL1_LNOISE,
        )?;
        Ok(())
    }

    /// Switch between polled and data-ready-interrupt operation
    ///
    /// The device ignores most control writes while active, so it is
    /// taken out of active mode around the update.
    pub fn set_mode(&mut self, mode: AccelMode) -> Result<(), AccelError> {
        self.mode = mode;

        let mut reg4 = self.bus.read_register(reg::CTRL_REG4)?;
        match mode {
            AccelMode::Polling => reg4 &= !CTRL4_INT_EN_DRDY,
            AccelMode::DataReadyInterrupt => reg4 |= CTRL4_INT_EN_DRDY,
        }

        self.set_active(false)?;
        self.bus.write_register(reg::CTRL_REG4, reg4)?;
        if mode == AccelMode::DataReadyInterrupt {
            // Route the data-ready interrupt to INT1.
            self.bus.write_register(reg::CTRL_REG5, CTRL5_INT_CFG_DRDY)?;
        }
        self.set_active(true)?;
        Ok(())
    }

    /// Currently configured mode
    pub fn mode(&self) -> AccelMode {
        self.mode
    }

    /// Whether a fresh XYZ sample is waiting to be read
    pub fn data_ready(&mut self) -> Result<bool, AccelError> {
        Ok(self.bus.read_register(reg::STATUS)? & STATUS_ZYXDR != 0)
    }

    /// Clear a pending data-ready interrupt by reading INT_SOURCE
    pub fn interrupt_source(&mut self) -> Result<u8, AccelError> {
        Ok(self.bus.read_register(reg::INT_SOURCE)?)
    }

    /// Latest X/Y/Z sample, one byte per axis (fast-read layout)
    pub fn read_xyz(&mut self) -> Result<[u8; 3], AccelError> {
        self.bus.select(self.address);
        let mut sample = [0u8; 3];
        self.bus.read_registers(reg::OUT_X_MSB, &mut sample)?;
        Ok(sample)
    }

    fn set_active(&mut self, active: bool) -> Result<(), AccelError> {
        let mut reg1 = self.bus.read_register(reg::CTRL_REG1)?;
        if active {
            reg1 |= CTRL1_ACTIVE;
        } else {
            reg1 &= !CTRL1_ACTIVE;
        }
        self.bus.write_register(reg::CTRL_REG1, reg1)?;
        Ok(())
    }
}
