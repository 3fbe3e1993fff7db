//! Transaction descriptor and terminal status
//!
//! One descriptor exists per engine. It is overwritten at each
//! admission and, while status is Busy, only the interrupt handler
//! touches it.

use super::machine::Phase;

/// Longest read burst a single transaction can carry, in bytes
pub const READ_CAPACITY: usize = 8;

/// Transfer direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Write one byte to a device register
    Write,
    /// Read one or more bytes starting at a device register
    Read,
}

/// Externally observable state of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    /// No transaction in flight; a new one may be admitted
    Available,
    /// A transaction is being driven by the interrupt handler
    Busy,
    /// The last transaction aborted; admission treats this the same as
    /// [`Status::Available`]
    Error,
}

impl Status {
    pub(crate) const fn as_u8(self) -> u8 {
        match self {
            Status::Available => 0,
            Status::Busy => 1,
            Status::Error => 2,
        }
    }

    pub(crate) const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Status::Busy,
            2 => Status::Error,
            _ => Status::Available,
        }
    }
}

/// Errors reported by the caller-facing bus surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cError {
    /// Another master drove the bus with conflicting data
    ArbitrationLost,
    /// The slave did not acknowledge an address or data byte
    Nack,
    /// Read length outside `1..=READ_CAPACITY`
    InvalidLength,
}

/// Reasons an admission attempt refuses a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdmissionError {
    /// A transaction is already in flight, or a bus peer holds the bus;
    /// retry later
    Busy,
    /// Read length outside `1..=READ_CAPACITY`; retrying cannot help
    InvalidLength,
    /// Arbitration was lost while asserting START; the whole
    /// transaction must be re-attempted
    ArbitrationLost,
}

/// Completion notification, delivered from interrupt context
///
/// Invoked exactly once, when (and only when) the transaction reaches
/// its successful terminal state. Aborted transactions are observed
/// through [`Status::Error`] instead.
#[derive(Debug, Clone, Copy)]
pub struct Completion {
    /// Function to invoke; must not block
    pub call: fn(u32),
    /// Opaque value handed back to `call`
    pub token: u32,
}

impl Completion {
    pub(crate) fn invoke(self) {
        (self.call)(self.token)
    }
}

/// Wire form of a 7-bit address with the R/W bit set for reading
pub(crate) const fn read_address(address: u8) -> u8 {
    (address << 1) | 0x01
}

/// Wire form of a 7-bit address with the R/W bit clear for writing
pub(crate) const fn write_address(address: u8) -> u8 {
    address << 1
}

/// In-flight transaction state
pub(crate) struct Transaction {
    pub direction: Direction,
    /// Slave address, snapshotted at admission so a later
    /// `select_slave` cannot redirect a transaction mid-flight
    pub address: u8,
    /// Device register the transaction targets
    pub register: u8,
    /// Payload byte for writes; unused for reads
    pub value: u8,
    /// Received bytes, valid up to `cursor` once the transaction
    /// completes
    pub data: [u8; READ_CAPACITY],
    /// Requested byte count, fixed for the transaction's lifetime
    pub len: usize,
    /// Receive cursor; only ever incremented
    pub cursor: usize,
    pub phase: Phase,
    pub completion: Option<Completion>,
}

impl Transaction {
    /// Placeholder contents before the first admission
    pub(crate) const fn idle() -> Self {
        Self {
            direction: Direction::Write,
            address: 0,
            register: 0,
            value: 0,
            data: [0; READ_CAPACITY],
            len: 0,
            cursor: 0,
            phase: Phase::SendRegister,
            completion: None,
        }
    }
}
