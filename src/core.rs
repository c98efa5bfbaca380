// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

use byteorder::{ByteOrder, LittleEndian};
use std::error::Error;
use std::ops::Not;

/// Interface to an I2C Slave Device from an I2C Master
///
/// Typical implementations will store state with references to the bus
/// in use and the address of the slave device.  The trait is based on the
/// Linux i2cdev interface.  The SMBus helpers have default implementations
/// in terms of plain reads and writes; backends with native SMBus support
/// override them.
pub trait I2CDevice {
    type Error: Error;

    /// Read data from the device to fill the provided slice
    fn read(&mut self, data: &mut [u8]) -> Result<(), Self::Error>;

    /// Write the provided buffer to the device
    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Read a single byte from a device, without specifying a device register
    fn smbus_read_byte(&mut self) -> Result<u8, Self::Error> {
        let mut buf = [0_u8];
        self.read(&mut buf)?;
        Ok(buf[0])
    }

    /// Write a single byte to a device, without specifying a device register
    ///
    /// Many simple chips take their whole command as one byte.
    fn smbus_write_byte(&mut self, value: u8) -> Result<(), Self::Error> {
        self.write(&[value])
    }

    /// Read a single byte from a device, from a designated register
    fn smbus_read_byte_data(&mut self, register: u8) -> Result<u8, Self::Error> {
        self.smbus_write_byte(register)?;
        self.smbus_read_byte()
    }

    /// Write a single byte to a specific register on a device
    fn smbus_write_byte_data(&mut self, register: u8, value: u8) -> Result<(), Self::Error> {
        self.write(&[register, value])
    }

    /// Read 2 bytes from a given register on a device (lsb first)
    fn smbus_read_word_data(&mut self, register: u8) -> Result<u16, Self::Error> {
        let mut buf = [0_u8; 2];
        self.smbus_write_byte(register)?;
        self.read(&mut buf)?;
        Ok(LittleEndian::read_u16(&buf))
    }

    /// Write 2 bytes to a given register on a device (lsb first)
    fn smbus_write_word_data(&mut self, register: u8, value: u16) -> Result<(), Self::Error> {
        let mut buf = [register, 0, 0];
        LittleEndian::write_u16(&mut buf[1..], value);
        self.write(&buf)
    }

    /// Read `len` consecutive registers starting at `register`
    fn smbus_read_i2c_block_data(&mut self, register: u8, len: u8) -> Result<Vec<u8>, Self::Error> {
        let mut buf = vec![0_u8; len as usize];
        self.smbus_write_byte(register)?;
        self.read(&mut buf)?;
        Ok(buf)
    }

    /// Write up to 32 bytes to consecutive registers starting at `register`
    fn smbus_write_i2c_block_data(&mut self, register: u8, values: &[u8]) -> Result<(), Self::Error> {
        let len = values.len().min(32);
        let mut buf = Vec::with_capacity(len + 1);
        buf.push(register);
        buf.extend_from_slice(&values[..len]);
        self.write(&buf)
    }
}

/// Logic level of a digital line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Level {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> bool {
        level == Level::High
    }
}

impl Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

/// Direction a digital line is configured for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// A single digital line that can be switched between input and output
///
/// Implemented by the Linux GPIO character device backend, by the mock
/// pins used in tests, and by the I/O expander pin adapters.
pub trait GpioPin {
    type Error: Error;

    /// Reconfigure the line direction
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error>;

    /// The direction the line is currently configured for
    fn direction(&self) -> Direction;

    /// Sample the line
    fn read(&mut self) -> Result<Level, Self::Error>;

    /// Drive the line (only meaningful while configured as an output)
    fn write(&mut self, level: Level) -> Result<(), Self::Error>;

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(Level::High)
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(Level::Low)
    }

    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.read()? == Level::High)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.read()? == Level::Low)
    }
}
