//! Per-event bus state machine
//!
//! The admission path asserts START and puts the slave address on the
//! wire; every later step runs from the interrupt handler, one phase
//! per byte event. [`Transaction::advance`] is that transition
//! function.

use seismo_hal::i2c::I2cHardware;

use super::transaction::{read_address, Direction, Transaction};

/// Wire protocol phase
///
/// Write transactions move `SendRegister → SendValue → SendStop`; read
/// transactions move `SendRegister → SendReadAddress → SwitchToReceive
/// → ReceiveData`. Encoding the direction into distinct phases keeps
/// combinations like "receiving before the repeated START" out of the
/// state space entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// Address (write) is on the wire; next drive the register
    /// sub-address
    SendRegister,
    /// Write: register sent; next drive the payload byte
    SendValue,
    /// Write: payload sent; the next event terminates the transaction
    SendStop,
    /// Read: register sent; next assert a repeated START and drive the
    /// address shifted for reading
    SendReadAddress,
    /// Read: address (read) sent; next switch the controller to receive
    /// and prime its one-byte read-ahead pipeline
    SwitchToReceive,
    /// Read: data bytes arriving
    ReceiveData,
}

/// Outcome of processing one byte event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Progress {
    /// More byte events to come
    InFlight,
    /// Terminal: the transaction succeeded, generate STOP
    Complete,
    /// Terminal: the slave NACKed a byte it had to acknowledge
    Nacked,
}

impl Transaction {
    /// Consume one byte-level bus event
    ///
    /// `nacked` is the acknowledge bit sampled for the byte whose
    /// completion raised this event. A NACK aborts every phase that
    /// follows a transmitted byte except `SendStop`: the final payload
    /// byte is already on the wire when its ACK is sampled and the
    /// sequence terminates either way.
    pub(crate) fn advance<H: I2cHardware>(&mut self, hardware: &mut H, nacked: bool) -> Progress {
        match self.phase {
            Phase::SendRegister => {
                if nacked {
                    return Progress::Nacked;
                }
                hardware.write_data(self.register);
                self.phase = match self.direction {
                    Direction::Write => Phase::SendValue,
                    Direction::Read => Phase::SendReadAddress,
                };
            }
            Phase::SendValue => {
                if nacked {
                    return Progress::Nacked;
                }
                hardware.write_data(self.value);
                self.phase = Phase::SendStop;
            }
            Phase::SendStop => return Progress::Complete,
            Phase::SendReadAddress => {
                if nacked {
                    return Progress::Nacked;
                }
                hardware.repeated_start();
                hardware.write_data(read_address(self.address));
                self.phase = Phase::SwitchToReceive;
            }
            Phase::SwitchToReceive => {
                if nacked {
                    return Progress::Nacked;
                }
                hardware.set_receive();
                if self.len == 1 {
                    hardware.nack_next();
                } else {
                    hardware.ack_next();
                }
                // Dummy read: triggers reception of the first data
                // byte. The value read here is not data.
                let _ = hardware.read_data();
                self.phase = Phase::ReceiveData;
            }
            Phase::ReceiveData => {
                let remaining = self.len - self.cursor - 1;
                if remaining == 0 {
                    // Back to transmit before touching the data
                    // register so the read below does not trigger
                    // another reception.
                    hardware.set_transmit();
                    self.data[self.cursor] = hardware.read_data();
                    self.cursor += 1;
                    return Progress::Complete;
                }
                if remaining == 1 {
                    // The byte being clocked in right now is the last
                    // one wanted; answer it with NACK.
                    hardware.nack_next();
                }
                self.data[self.cursor] = hardware.read_data();
                self.cursor += 1;
            }
        }
        Progress::InFlight
    }
}
