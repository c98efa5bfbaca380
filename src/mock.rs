// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! In-memory stand-ins for buses and pins, used by the driver tests

use crate::core::{Direction, GpioPin, I2CDevice, Level};
use log::trace;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

/// 256 byte register file with an auto-incrementing offset
pub struct I2CRegisterMap {
    registers: [u8; 0x100],
    offset: usize,
}

impl Default for I2CRegisterMap {
    fn default() -> Self {
        Self::new()
    }
}

impl I2CRegisterMap {
    pub fn new() -> I2CRegisterMap {
        I2CRegisterMap {
            registers: [0x00; 0x100],
            offset: 0,
        }
    }

    pub fn write_regs(&mut self, offset: usize, data: &[u8]) {
        trace!("WRITE | 0x{:X} : {:?}", offset, data);
        for (i, byte) in data.iter().enumerate() {
            self.registers[(offset + i) & 0xFF] = *byte;
        }
    }

    pub fn read_regs(&self, offset: usize, len: usize) -> Vec<u8> {
        (0..len).map(|i| self.registers[(offset + i) & 0xFF]).collect()
    }

    pub fn reg(&self, offset: u8) -> u8 {
        self.registers[offset as usize]
    }
}

impl I2CDevice for I2CRegisterMap {
    type Error = io::Error;

    fn read(&mut self, data: &mut [u8]) -> Result<(), io::Error> {
        for byte in data.iter_mut() {
            *byte = self.registers[self.offset];
            self.offset = (self.offset + 1) & 0xFF;
        }
        trace!("READ  | 0x{:X} : {:?}", self.offset, data);
        Ok(())
    }

    /// The first byte selects the offset, the rest is written from there
    fn write(&mut self, data: &[u8]) -> Result<(), io::Error> {
        let (offset, remdata) = match data.split_first() {
            Some((offset, rest)) => (*offset as usize, rest),
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "empty write",
                ))
            }
        };
        self.write_regs(offset, remdata);
        self.offset = (offset + remdata.len()) & 0xFF;
        Ok(())
    }
}

/// I2C device backed by a register map, remembering every write
#[derive(Default)]
pub struct MockI2CDevice {
    pub regmap: I2CRegisterMap,
    pub writes: Vec<Vec<u8>>,
}

impl MockI2CDevice {
    pub fn new() -> MockI2CDevice {
        MockI2CDevice {
            regmap: I2CRegisterMap::new(),
            writes: Vec::new(),
        }
    }

    pub fn last_write(&self) -> Option<&[u8]> {
        self.writes.last().map(|w| &w[..])
    }
}

impl I2CDevice for MockI2CDevice {
    type Error = io::Error;

    fn read(&mut self, data: &mut [u8]) -> Result<(), io::Error> {
        self.regmap.read(data)
    }

    fn write(&mut self, data: &[u8]) -> Result<(), io::Error> {
        self.writes.push(data.to_vec());
        self.regmap.write(data)
    }
}

struct PinState {
    direction: Direction,
    level: Level,
    history: Vec<Level>,
    input: VecDeque<Level>,
}

/// A GPIO line with shared state
///
/// Clones refer to the same line, so a test can hand one clone to a driver
/// and inspect the other.  Every write is appended to the history; reads
/// pop queued input levels and fall back to the last level once the queue
/// is drained.
#[derive(Clone)]
pub struct MockPin {
    state: Rc<RefCell<PinState>>,
}

impl Default for MockPin {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPin {
    pub fn new() -> MockPin {
        MockPin {
            state: Rc::new(RefCell::new(PinState {
                direction: Direction::Input,
                level: Level::Low,
                history: Vec::new(),
                input: VecDeque::new(),
            })),
        }
    }

    pub fn queue_input<I: IntoIterator<Item = Level>>(&self, levels: I) {
        self.state.borrow_mut().input.extend(levels);
    }

    /// Queue the bits of `value`, most significant first
    pub fn queue_bits(&self, value: u32, count: u8) {
        self.queue_input((0..count).rev().map(|i| Level::from(value & (1 << i) != 0)));
    }

    pub fn history(&self) -> Vec<Level> {
        self.state.borrow().history.clone()
    }

    pub fn clear_history(&self) {
        self.state.borrow_mut().history.clear();
    }

    pub fn level(&self) -> Level {
        self.state.borrow().level
    }

    pub fn pending_input(&self) -> usize {
        self.state.borrow().input.len()
    }
}

impl GpioPin for MockPin {
    type Error = io::Error;

    fn set_direction(&mut self, direction: Direction) -> Result<(), io::Error> {
        self.state.borrow_mut().direction = direction;
        Ok(())
    }

    fn direction(&self) -> Direction {
        self.state.borrow().direction
    }

    fn read(&mut self) -> Result<Level, io::Error> {
        let mut state = self.state.borrow_mut();
        if let Some(level) = state.input.pop_front() {
            state.level = level;
        }
        Ok(state.level)
    }

    fn write(&mut self, level: Level) -> Result<(), io::Error> {
        let mut state = self.state.borrow_mut();
        state.level = level;
        state.history.push(level);
        Ok(())
    }
}

/// Collapse a pin history into the bits it carried, most significant first
pub fn bits_of(levels: &[Level]) -> u32 {
    levels
        .iter()
        .fold(0, |acc, level| (acc << 1) | (*level == Level::High) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regmap_offset_auto_increments() {
        let mut dev = MockI2CDevice::new();
        dev.regmap.write_regs(0x10, &[1, 2, 3]);
        assert_eq!(dev.smbus_read_byte_data(0x10).unwrap(), 1);
        assert_eq!(dev.smbus_read_byte().unwrap(), 2);
        assert_eq!(dev.smbus_read_word_data(0x11).unwrap(), 0x0302);
        dev.smbus_write_byte_data(0x20, 0xAB).unwrap();
        assert_eq!(dev.regmap.reg(0x20), 0xAB);
        assert_eq!(dev.last_write(), Some(&[0x20, 0xAB][..]));
    }

    #[test]
    fn pin_replays_queued_input() {
        let mut pin = MockPin::new();
        let observer = pin.clone();
        pin.queue_bits(0b101, 3);
        assert_eq!(pin.read().unwrap(), Level::High);
        assert_eq!(pin.read().unwrap(), Level::Low);
        assert_eq!(pin.read().unwrap(), Level::High);
        // drained: the last level sticks
        assert_eq!(pin.read().unwrap(), Level::High);
        pin.write(Level::Low).unwrap();
        assert_eq!(observer.history(), vec![Level::Low]);
        assert_eq!(observer.level(), Level::Low);
    }
}
