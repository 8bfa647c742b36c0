#![allow(dead_code)]

use bq25758_async_rs::Register;
use core::convert::Infallible;
use embedded_hal::digital::{ErrorType as PinErrorType, OutputPin, StatefulOutputPin};
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
use std::cell::RefCell;
use std::rc::Rc;

pub const BQ25758_ADDR: u8 = 0x6B;

/// A mock I2C device that can be programmed with expected transactions.
#[derive(Clone)]
pub struct MockI2c {
    mock: Rc<RefCell<I2cMock>>,
}

impl MockI2c {
    /// Creates a new `MockI2c` with the given expected transactions.
    pub fn new(transactions: &[I2cTransaction]) -> Self {
        Self {
            mock: Rc::new(RefCell::new(I2cMock::new(transactions))),
        }
    }

    /// Consumes the mock and verifies that all expected transactions occurred.
    pub fn done(self) {
        self.mock.borrow_mut().done();
    }
}

impl ErrorType for MockI2c {
    type Error = ErrorKind;
}

impl I2c for MockI2c {
    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        self.mock
            .borrow_mut()
            .write(address, bytes)
            .map_err(|_| ErrorKind::Other)
    }

    fn read(&mut self, address: u8, bytes: &mut [u8]) -> Result<(), Self::Error> {
        self.mock
            .borrow_mut()
            .read(address, bytes)
            .map_err(|_| ErrorKind::Other)
    }

    fn write_read(
        &mut self,
        address: u8,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.mock
            .borrow_mut()
            .write_read(address, bytes, buffer)
            .map_err(|_| ErrorKind::Other)
    }

    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.mock
            .borrow_mut()
            .transaction(address, operations)
            .map_err(|_| ErrorKind::Other)
    }
}

/// A register-backed fake BQ25758: writes land in a 256-byte register file
/// and reads return whatever was stored there. Any address other than the
/// configured one is NACKed.
#[derive(Clone)]
pub struct RegisterFile {
    state: Rc<RefCell<RegisterFileState>>,
}

struct RegisterFileState {
    address: u8,
    regs: [u8; 256],
    writes: Vec<(u8, Vec<u8>)>,
}

impl RegisterFile {
    pub fn new(address: u8) -> Self {
        Self {
            state: Rc::new(RefCell::new(RegisterFileState {
                address,
                regs: [0; 256],
                writes: Vec::new(),
            })),
        }
    }

    pub fn set(&self, reg: Register, value: u8) {
        self.state.borrow_mut().regs[reg as usize] = value;
    }

    pub fn set_u16(&self, reg: Register, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        let mut state = self.state.borrow_mut();
        state.regs[reg as usize] = lo;
        state.regs[reg as usize + 1] = hi;
    }

    pub fn get(&self, reg: Register) -> u8 {
        self.state.borrow().regs[reg as usize]
    }

    pub fn get_u16(&self, reg: Register) -> u16 {
        let state = self.state.borrow();
        u16::from_le_bytes([state.regs[reg as usize], state.regs[reg as usize + 1]])
    }

    /// Every write so far, as (register, payload).
    pub fn writes(&self) -> Vec<(u8, Vec<u8>)> {
        self.state.borrow().writes.clone()
    }
}

impl ErrorType for RegisterFile {
    type Error = ErrorKind;
}

impl I2c for RegisterFile {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        if address != state.address {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        let mut pointer: Option<u8> = None;
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    let Some((&reg, data)) = bytes.split_first() else {
                        continue;
                    };
                    let mut addr = reg;
                    for &byte in data {
                        state.regs[addr as usize] = byte;
                        addr = addr.wrapping_add(1);
                    }
                    if !data.is_empty() {
                        state.writes.push((reg, data.to_vec()));
                    }
                    pointer = Some(reg);
                }
                Operation::Read(buffer) => {
                    let mut addr = pointer.ok_or(ErrorKind::Other)?;
                    for byte in buffer.iter_mut() {
                        *byte = state.regs[addr as usize];
                        addr = addr.wrapping_add(1);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(feature = "async")]
impl embedded_hal_async::i2c::I2c for RegisterFile {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        I2c::transaction(self, address, operations)
    }
}

/// Output pin that remembers its level. `None` until first driven.
#[derive(Clone, Default)]
pub struct FakePin {
    high: Rc<RefCell<Option<bool>>>,
}

impl FakePin {
    pub fn level_high(&self) -> Option<bool> {
        *self.high.borrow()
    }
}

impl PinErrorType for FakePin {
    type Error = Infallible;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        *self.high.borrow_mut() = Some(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        *self.high.borrow_mut() = Some(true);
        Ok(())
    }
}

impl StatefulOutputPin for FakePin {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.high.borrow().unwrap_or(false))
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.high.borrow().unwrap_or(false))
    }
}
