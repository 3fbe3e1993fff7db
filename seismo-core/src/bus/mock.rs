//! Scripted controller mock for engine tests
//!
//! Records every operation the engine performs and plays back scripted
//! event flags and received bytes, so tests can assert the exact wire
//! behavior of a transaction.

use core::cell::RefCell;

use heapless::{Deque, Vec};
use seismo_hal::i2c::{Divider, EventFlags, I2cHardware};

/// One controller operation, in the order the engine issued it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    SetDivider { icr: u8, mult: u8 },
    Enable,
    ClearEvent,
    ClearArbitrationLoss,
    EnableInterrupt,
    DisableInterrupt,
    Start,
    RepeatedStart,
    Stop,
    Release,
    SetTransmit,
    SetReceive,
    AckNext,
    NackNext,
    WriteData(u8),
    ReadData,
}

pub(crate) struct MockHardware {
    ops: Vec<Op, 64>,
    /// Bytes the data register yields, front first. Scripts must
    /// include the dummy byte a read transaction discards.
    rx: Deque<u8, 16>,
    /// Flags returned by successive `event_flags` calls, front first.
    /// An empty queue reports a plain pending event.
    flags: RefCell<Deque<EventFlags, 16>>,
    pub bus_busy: bool,
}

impl MockHardware {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            rx: Deque::new(),
            flags: RefCell::new(Deque::new()),
            bus_busy: false,
        }
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    pub fn push_rx(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.rx.push_back(byte).unwrap();
        }
    }

    pub fn push_flags(&mut self, flags: EventFlags) {
        self.flags.borrow_mut().push_back(flags).unwrap();
    }

    fn record(&mut self, op: Op) {
        // Long pump loops may outrun the log; exact-sequence tests stay
        // well under its capacity.
        self.ops.push(op).ok();
    }
}

impl I2cHardware for MockHardware {
    fn set_divider(&mut self, divider: Divider) {
        self.record(Op::SetDivider {
            icr: divider.icr,
            mult: divider.multiplier.code(),
        });
    }

    fn enable(&mut self) {
        self.record(Op::Enable);
    }

    fn bus_busy(&self) -> bool {
        self.bus_busy
    }

    fn event_flags(&self) -> EventFlags {
        self.flags.borrow_mut().pop_front().unwrap_or(EventFlags {
            pending: true,
            arbitration_lost: false,
            nacked: false,
        })
    }

    fn clear_event(&mut self) {
        self.record(Op::ClearEvent);
    }

    fn clear_arbitration_loss(&mut self) {
        self.record(Op::ClearArbitrationLoss);
    }

    fn enable_interrupt(&mut self) {
        self.record(Op::EnableInterrupt);
    }

    fn disable_interrupt(&mut self) {
        self.record(Op::DisableInterrupt);
    }

    fn start(&mut self) {
        self.record(Op::Start);
    }

    fn repeated_start(&mut self) {
        self.record(Op::RepeatedStart);
    }

    fn stop(&mut self) {
        self.record(Op::Stop);
    }

    fn release(&mut self) {
        self.record(Op::Release);
    }

    fn set_transmit(&mut self) {
        self.record(Op::SetTransmit);
    }

    fn set_receive(&mut self) {
        self.record(Op::SetReceive);
    }

    fn ack_next(&mut self) {
        self.record(Op::AckNext);
    }

    fn nack_next(&mut self) {
        self.record(Op::NackNext);
    }

    fn write_data(&mut self, byte: u8) {
        self.record(Op::WriteData(byte));
    }

    fn read_data(&mut self) -> u8 {
        self.record(Op::ReadData);
        self.rx.pop_front().unwrap_or(0xFF)
    }
}
