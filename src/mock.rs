//! Recording doubles for the bus, pins and delay used by the unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};

use crate::bus::{DataPort, Direction, ParallelBus};
use crate::command::Register;

/// One bus primitive as seen by [`MockBus`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Command(u16),
    Data(u16),
    Read,
}

#[derive(Debug, PartialEq, Eq)]
pub struct MockError;

/// Bus adapter that records every primitive and answers reads from a script.
#[derive(Default)]
pub struct MockBus {
    pub ops: Vec<Op>,
    pub reads: VecDeque<u16>,
    /// Index of the primitive that should fail (not recorded).
    pub fail_at: Option<usize>,
    calls: usize,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reads(reads: &[u16]) -> Self {
        Self {
            reads: reads.iter().copied().collect(),
            ..Self::default()
        }
    }

    /// Makes the `n`-th primitive from now fail.
    pub fn fail_in(&mut self, n: usize) {
        self.fail_at = Some(self.calls + n);
    }

    fn tick(&mut self) -> Result<(), MockError> {
        let n = self.calls;
        self.calls += 1;
        if self.fail_at == Some(n) {
            Err(MockError)
        } else {
            Ok(())
        }
    }

    /// Register writes as (address, value) pairs, in order.
    pub fn register_writes(&self) -> Vec<(u16, u16)> {
        self.ops
            .windows(2)
            .filter_map(|w| match (w[0], w[1]) {
                (Op::Command(c), Op::Data(d)) if c != Register::WriteDataToGram.addr() => {
                    Some((c, d))
                }
                _ => None,
            })
            .collect()
    }

    /// Data words written after the last GRAM stream command.
    pub fn last_stream(&self) -> Vec<u16> {
        let gram = Op::Command(Register::WriteDataToGram.addr());
        let start = self
            .ops
            .iter()
            .rposition(|op| *op == gram)
            .map_or(0, |i| i + 1);
        self.ops[start..]
            .iter()
            .filter_map(|op| match op {
                Op::Data(d) => Some(*d),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, op: Op) -> usize {
        self.ops.iter().filter(|o| **o == op).count()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

impl ParallelBus for MockBus {
    type Error = MockError;

    fn write_command(&mut self, code: u16) -> Result<(), MockError> {
        self.tick()?;
        self.ops.push(Op::Command(code));
        Ok(())
    }

    fn write_data(&mut self, value: u16) -> Result<(), MockError> {
        self.tick()?;
        self.ops.push(Op::Data(value));
        Ok(())
    }

    fn read_data(&mut self) -> Result<u16, MockError> {
        self.tick()?;
        self.ops.push(Op::Read);
        Ok(self.reads.pop_front().unwrap_or(0))
    }
}

/// Electrical event seen by the GPIO doubles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Pin(&'static str, bool),
    Direction(Direction),
    PortWrite(u8),
    PortRead(u8),
    DelayNs(u32),
    DelayUs(u32),
    DelayMs(u32),
}

pub type Log = Rc<RefCell<Vec<Event>>>;

pub fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub struct MockPin {
    name: &'static str,
    log: Log,
}

impl MockPin {
    pub fn new(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            log: log.clone(),
        }
    }
}

impl ErrorType for MockPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(Event::Pin(self.name, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(Event::Pin(self.name, true));
        Ok(())
    }
}

pub struct MockPort {
    log: Log,
    reads: VecDeque<u8>,
    fail_read_at: Option<usize>,
}

impl MockPort {
    pub fn new(log: &Log, reads: &[u8]) -> Self {
        Self {
            log: log.clone(),
            reads: reads.iter().copied().collect(),
            fail_read_at: None,
        }
    }

    /// Makes the `n`-th read from now fail (zero is the next one).
    pub fn fail_read_in(&mut self, n: usize) {
        self.fail_read_at = Some(n);
    }
}

impl DataPort for MockPort {
    type Error = MockError;

    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(Event::Direction(direction));
        Ok(())
    }

    fn write(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.log.borrow_mut().push(Event::PortWrite(byte));
        Ok(())
    }

    fn read(&mut self) -> Result<u8, Self::Error> {
        match self.fail_read_at {
            Some(0) => {
                self.fail_read_at = None;
                return Err(MockError);
            }
            Some(n) => self.fail_read_at = Some(n - 1),
            None => {}
        }
        let byte = self.reads.pop_front().unwrap_or(0);
        self.log.borrow_mut().push(Event::PortRead(byte));
        Ok(byte)
    }
}

/// Records requested durations instead of sleeping.
pub struct MockDelay {
    log: Log,
}

impl MockDelay {
    pub fn new(log: &Log) -> Self {
        Self { log: log.clone() }
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.log.borrow_mut().push(Event::DelayNs(ns));
    }

    fn delay_us(&mut self, us: u32) {
        self.log.borrow_mut().push(Event::DelayUs(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.log.borrow_mut().push(Event::DelayMs(ms));
    }
}
