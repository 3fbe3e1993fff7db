//! Interrupt-driven I2C master transaction engine
//!
//! The engine drives register reads and writes on an I2C bus without
//! blocking anything but the caller that asked for them. A transaction
//! is admitted from thread context ([`I2cMaster::try_write`] /
//! [`I2cMaster::try_read`]), which asserts START and puts the slave
//! address on the wire; every subsequent byte event raises the
//! controller interrupt and [`I2cMaster::on_interrupt`] walks the
//! transaction one phase at a time until STOP or abort.
//!
//! At most one transaction is in flight. The gate is the atomic
//! [`Status`] flag: admission claims it with a compare-exchange, the
//! interrupt handler releases it with a store once the transaction
//! terminates, and every caller-side mutation of the descriptor happens
//! strictly before the claim succeeds. No other locking is involved at
//! this layer; [`SharedI2c`] adds the critical-section sharing that
//! thread contexts need.

mod baud;
mod machine;
#[cfg(test)]
pub(crate) mod mock;
mod shared;
mod transaction;

pub use baud::{find_divider, scl_rate, ConfigError, SCL_DIVIDERS, TOLERANCE_HZ};
pub use shared::SharedI2c;
pub use transaction::{
    AdmissionError, Completion, Direction, I2cError, Status, READ_CAPACITY,
};

use machine::{Phase, Progress};
use portable_atomic::{AtomicU8, Ordering};
use seismo_hal::i2c::I2cHardware;
use transaction::{write_address, Transaction};

/// I2C master transaction engine
///
/// Generic over the register-level controller so the same sequencing
/// logic runs on the target and against a mock on the host.
pub struct I2cMaster<H: I2cHardware> {
    hardware: H,
    /// Currently selected slave; persists until changed
    slave: u8,
    transaction: Transaction,
    status: AtomicU8,
    /// Why the last transaction ended in [`Status::Error`]
    fault: Option<I2cError>,
}

impl<H: I2cHardware> I2cMaster<H> {
    pub const fn new(hardware: H) -> Self {
        Self {
            hardware,
            slave: 0,
            transaction: Transaction::idle(),
            status: AtomicU8::new(Status::Available.as_u8()),
            fault: None,
        }
    }

    /// Run the divider search and bring the controller up
    ///
    /// Fails if no divider pair lands within tolerance of `target_hz`;
    /// that is a fatal configuration error, not something to retry.
    pub fn init(&mut self, target_hz: u32, module_clock_hz: u32) -> Result<(), ConfigError> {
        let divider = baud::find_divider(target_hz, module_clock_hz)?;
        self.hardware.set_divider(divider);
        self.hardware.enable();
        Ok(())
    }

    /// Select the slave device subsequent transactions address
    pub fn select_slave(&mut self, address: u8) {
        self.slave = address;
    }

    /// Raw controller access for board-level bring-up (pin muxing,
    /// clock gating)
    pub fn hardware(&mut self) -> &mut H {
        &mut self.hardware
    }

    /// Engine status, readable from any context
    pub fn status(&self) -> Status {
        Status::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Why the last transaction ended in [`Status::Error`]
    pub fn fault(&self) -> Option<I2cError> {
        self.fault
    }

    /// Copy the bytes received by the most recent completed read
    ///
    /// Returns how many bytes were copied. Meaningful only once the
    /// transaction has left [`Status::Busy`].
    pub fn read_result(&self, dest: &mut [u8]) -> usize {
        let count = self.transaction.cursor.min(dest.len());
        dest[..count].copy_from_slice(&self.transaction.data[..count]);
        count
    }

    /// Admit a register write of one byte
    pub fn try_write(
        &mut self,
        register: u8,
        value: u8,
        completion: Option<Completion>,
    ) -> Result<(), AdmissionError> {
        self.try_begin(Direction::Write, register, value, 0, completion)
    }

    /// Admit a register read of `len` bytes
    pub fn try_read(
        &mut self,
        register: u8,
        len: usize,
        completion: Option<Completion>,
    ) -> Result<(), AdmissionError> {
        if len == 0 || len > READ_CAPACITY {
            return Err(AdmissionError::InvalidLength);
        }
        self.try_begin(Direction::Read, register, 0, len, completion)
    }

    fn try_begin(
        &mut self,
        direction: Direction,
        register: u8,
        value: u8,
        len: usize,
        completion: Option<Completion>,
    ) -> Result<(), AdmissionError> {
        // The descriptor gate. Error is what an aborted transaction
        // leaves behind and admits like Available; only Busy rejects.
        let current = self.status.load(Ordering::Acquire);
        if current == Status::Busy.as_u8() {
            return Err(AdmissionError::Busy);
        }
        // A transaction initiated by a bus peer also rejects admission.
        if self.hardware.bus_busy() {
            return Err(AdmissionError::Busy);
        }
        if self
            .status
            .compare_exchange(
                current,
                Status::Busy.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return Err(AdmissionError::Busy);
        }

        // We own the descriptor until status leaves Busy. All fields
        // must be in place before the first byte event can fire.
        self.fault = None;
        self.transaction = Transaction {
            direction,
            address: self.slave,
            register,
            value,
            data: [0; READ_CAPACITY],
            len,
            cursor: 0,
            phase: Phase::SendRegister,
            completion,
        };

        self.hardware.clear_event();
        self.hardware.enable();
        self.hardware.enable_interrupt();
        self.hardware.start();

        // A peer may have asserted START in the same window; the
        // controller reports that as an immediate arbitration loss.
        if self.hardware.event_flags().arbitration_lost {
            self.hardware.clear_arbitration_loss();
            self.hardware.release();
            self.hardware.disable_interrupt();
            self.fault = Some(I2cError::ArbitrationLost);
            self.status.store(Status::Error.as_u8(), Ordering::Release);
            return Err(AdmissionError::ArbitrationLost);
        }

        // The address byte goes out now; everything after this point
        // runs from the interrupt handler.
        self.hardware
            .write_data(write_address(self.transaction.address));
        Ok(())
    }

    /// Interrupt entry point: consume one byte-level bus event
    ///
    /// Route the controller's interrupt vector here. The vector may be
    /// shared with a second controller: if the hardware's pending flag
    /// is clear the event is not ours and no state is touched.
    pub fn on_interrupt(&mut self) {
        let flags = self.hardware.event_flags();
        if !flags.pending {
            return;
        }
        self.hardware.clear_event();

        if flags.arbitration_lost {
            self.hardware.clear_arbitration_loss();
            self.fail(I2cError::ArbitrationLost);
            return;
        }

        // A pending event with no live transaction has nothing to
        // advance (possible with a misrouted vector); drop it.
        if self.status() != Status::Busy {
            return;
        }

        match self.transaction.advance(&mut self.hardware, flags.nacked) {
            Progress::InFlight => {}
            Progress::Complete => self.complete(),
            Progress::Nacked => self.fail(I2cError::Nack),
        }
    }

    fn complete(&mut self) {
        self.hardware.stop();
        self.hardware.disable_interrupt();
        self.status
            .store(Status::Available.as_u8(), Ordering::Release);
        // Still in interrupt context, as the callback contract requires.
        if let Some(completion) = self.transaction.completion {
            completion.invoke();
        }
    }

    fn fail(&mut self, error: I2cError) {
        self.hardware.release();
        self.hardware.disable_interrupt();
        self.fault = Some(error);
        self.status.store(Status::Error.as_u8(), Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{MockHardware, Op};
    use super::*;
    use portable_atomic::{AtomicU32, Ordering};
    use seismo_hal::i2c::EventFlags;

    const ACCEL: u8 = 0x1D;

    fn master() -> I2cMaster<MockHardware> {
        let mut master = I2cMaster::new(MockHardware::new());
        master.select_slave(ACCEL);
        master
    }

    fn pump(master: &mut I2cMaster<MockHardware>) -> usize {
        let mut events = 0;
        while master.status() == Status::Busy {
            master.on_interrupt();
            events += 1;
            assert!(events < 32, "transaction never terminated");
        }
        events
    }

    fn data_writes(ops: &[Op]) -> std::vec::Vec<u8> {
        ops.iter()
            .filter_map(|op| match op {
                Op::WriteData(byte) => Some(*byte),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_write_drives_register_value_stop() {
        let mut master = master();
        master.try_write(0x2A, 0x05, None).unwrap();
        assert_eq!(master.status(), Status::Busy);

        // Admission has already put the address byte on the wire.
        assert_eq!(
            master.hardware.ops(),
            &[
                Op::ClearEvent,
                Op::Enable,
                Op::EnableInterrupt,
                Op::Start,
                Op::WriteData(ACCEL << 1),
            ]
        );

        pump(&mut master);
        assert_eq!(master.status(), Status::Available);
        assert_eq!(data_writes(master.hardware.ops()), &[ACCEL << 1, 0x2A, 0x05]);
        let last_two = &master.hardware.ops()[master.hardware.ops().len() - 2..];
        assert_eq!(last_two, &[Op::Stop, Op::DisableInterrupt]);
    }

    #[test]
    fn test_three_byte_read() {
        let mut master = master();
        master.hardware.push_rx(&[0xEE, 0x10, 0x20, 0x30]);
        master.try_read(0x01, 3, None).unwrap();
        master.hardware.clear_ops();

        pump(&mut master);
        assert_eq!(master.status(), Status::Available);

        // Register, repeated start, read address, dummy read, three
        // data reads; NACK armed exactly once, before the final byte.
        assert_eq!(
            master.hardware.ops(),
            &[
                Op::ClearEvent,
                Op::WriteData(0x01),
                Op::ClearEvent,
                Op::RepeatedStart,
                Op::WriteData((ACCEL << 1) | 1),
                Op::ClearEvent,
                Op::SetReceive,
                Op::AckNext,
                Op::ReadData,
                Op::ClearEvent,
                Op::ReadData,
                Op::ClearEvent,
                Op::NackNext,
                Op::ReadData,
                Op::ClearEvent,
                Op::SetTransmit,
                Op::ReadData,
                Op::Stop,
                Op::DisableInterrupt,
            ]
        );

        let mut buffer = [0u8; 3];
        assert_eq!(master.read_result(&mut buffer), 3);
        assert_eq!(buffer, [0x10, 0x20, 0x30]);
    }

    #[test]
    fn test_read_is_idempotent_across_transactions() {
        let mut master = master();
        for _ in 0..2 {
            master.hardware.push_rx(&[0xEE, 0x10, 0x20, 0x30]);
            master.try_read(0x01, 3, None).unwrap();
            pump(&mut master);

            let mut buffer = [0u8; 3];
            assert_eq!(master.read_result(&mut buffer), 3);
            assert_eq!(buffer, [0x10, 0x20, 0x30]);
            master.hardware.clear_ops();
        }
    }

    #[test]
    fn test_busy_rejects_without_side_effects() {
        let mut master = master();
        master.try_write(0x2A, 0x05, None).unwrap();
        master.hardware.clear_ops();

        assert_eq!(
            master.try_write(0x0E, 0x77, None),
            Err(AdmissionError::Busy)
        );
        assert_eq!(master.try_read(0x00, 1, None), Err(AdmissionError::Busy));
        assert!(master.hardware.ops().is_empty());

        // The in-flight transaction is untouched: it still drives the
        // original register and value.
        pump(&mut master);
        assert_eq!(data_writes(master.hardware.ops()), &[0x2A, 0x05]);
    }

    #[test]
    fn test_peer_owned_bus_rejects() {
        let mut master = master();
        master.hardware.bus_busy = true;
        assert_eq!(
            master.try_write(0x2A, 0x05, None),
            Err(AdmissionError::Busy)
        );
        assert_eq!(master.status(), Status::Available);
        assert!(master.hardware.ops().is_empty());
    }

    #[test]
    fn test_zero_and_oversized_reads_rejected() {
        let mut master = master();
        assert_eq!(
            master.try_read(0x01, 0, None),
            Err(AdmissionError::InvalidLength)
        );
        assert_eq!(
            master.try_read(0x01, READ_CAPACITY + 1, None),
            Err(AdmissionError::InvalidLength)
        );
        // No bus activity was started.
        assert!(master.hardware.ops().is_empty());
        assert_eq!(master.status(), Status::Available);
    }

    #[test]
    fn test_write_nack_aborts_and_allows_retry() {
        let mut master = master();
        master.try_write(0x2A, 0x05, None).unwrap();
        // First event (address acked) is clean; the second reports the
        // NACK of the register byte.
        master.hardware.push_flags(EventFlags {
            pending: true,
            arbitration_lost: false,
            nacked: false,
        });
        master.hardware.push_flags(EventFlags {
            pending: true,
            arbitration_lost: false,
            nacked: true,
        });

        master.on_interrupt();
        assert_eq!(master.status(), Status::Busy);
        master.hardware.clear_ops();
        master.on_interrupt();

        assert_eq!(master.status(), Status::Error);
        assert_eq!(master.fault(), Some(I2cError::Nack));
        // Aborted: no further bytes driven, master mode dropped.
        assert_eq!(
            master.hardware.ops(),
            &[Op::ClearEvent, Op::Release, Op::DisableInterrupt]
        );

        // Error admits like Available; the retry runs to completion.
        master.hardware.clear_ops();
        master.try_write(0x2A, 0x05, None).unwrap();
        pump(&mut master);
        assert_eq!(master.status(), Status::Available);
    }

    #[test]
    fn test_arbitration_loss_mid_transaction() {
        static CALLS: AtomicU32 = AtomicU32::new(0);
        fn on_done(_: u32) {
            CALLS.fetch_add(1, Ordering::Relaxed);
        }

        let mut master = master();
        master
            .try_read(
                0x01,
                2,
                Some(Completion {
                    call: on_done,
                    token: 0,
                }),
            )
            .unwrap();
        master.hardware.push_flags(EventFlags {
            pending: true,
            arbitration_lost: true,
            nacked: false,
        });

        master.on_interrupt();
        assert_eq!(master.status(), Status::Error);
        assert_eq!(master.fault(), Some(I2cError::ArbitrationLost));
        // Aborted transactions never invoke the completion callback.
        assert_eq!(CALLS.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_arbitration_loss_at_start() {
        let mut master = master();
        master.hardware.push_flags(EventFlags {
            pending: false,
            arbitration_lost: true,
            nacked: false,
        });

        assert_eq!(
            master.try_write(0x2A, 0x05, None),
            Err(AdmissionError::ArbitrationLost)
        );
        assert_eq!(master.status(), Status::Error);
        // START was asserted but the address byte never went out.
        assert!(!master
            .hardware
            .ops()
            .iter()
            .any(|op| matches!(op, Op::WriteData(_))));
    }

    #[test]
    fn test_completion_invoked_once_with_token() {
        static LAST_TOKEN: AtomicU32 = AtomicU32::new(0);
        static CALLS: AtomicU32 = AtomicU32::new(0);
        fn on_done(token: u32) {
            LAST_TOKEN.store(token, Ordering::Relaxed);
            CALLS.fetch_add(1, Ordering::Relaxed);
        }

        let mut master = master();
        master.hardware.push_rx(&[0xEE, 0x42]);
        master
            .try_read(
                0x0D,
                1,
                Some(Completion {
                    call: on_done,
                    token: 0xA5A5,
                }),
            )
            .unwrap();
        pump(&mut master);

        assert_eq!(CALLS.load(Ordering::Relaxed), 1);
        assert_eq!(LAST_TOKEN.load(Ordering::Relaxed), 0xA5A5);
    }

    #[test]
    fn test_foreign_interrupt_is_ignored() {
        let mut master = master();
        master.try_write(0x2A, 0x05, None).unwrap();
        master.hardware.clear_ops();

        // Shared vector: the other controller raised this one.
        master.hardware.push_flags(EventFlags {
            pending: false,
            arbitration_lost: false,
            nacked: false,
        });
        master.on_interrupt();

        // Nothing acknowledged, nothing advanced.
        assert!(master.hardware.ops().is_empty());
        assert_eq!(master.status(), Status::Busy);

        // The transaction then proceeds normally.
        pump(&mut master);
        assert_eq!(master.status(), Status::Available);
    }

    #[test]
    fn test_selected_slave_persists() {
        let mut master = master();
        master.try_write(0x2A, 0x05, None).unwrap();
        pump(&mut master);

        master.hardware.clear_ops();
        master.try_write(0x2B, 0x40, None).unwrap();
        pump(&mut master);
        assert_eq!(
            data_writes(master.hardware.ops()),
            &[ACCEL << 1, 0x2B, 0x40]
        );

        master.select_slave(0x1C);
        master.hardware.clear_ops();
        master.try_write(0x2A, 0x01, None).unwrap();
        pump(&mut master);
        assert_eq!(
            data_writes(master.hardware.ops()),
            &[0x1C << 1, 0x2A, 0x01]
        );
    }

    #[test]
    fn test_init_programs_divider() {
        let mut master = master();
        master.init(100_000, 24_000_000).unwrap();
        assert_eq!(
            master.hardware.ops(),
            &[Op::SetDivider { icr: 0x1F, mult: 0 }, Op::Enable]
        );

        let error = master.init(100_000, 60_000_000).unwrap_err();
        assert_eq!(error.target_hz, 100_000);
    }
}
