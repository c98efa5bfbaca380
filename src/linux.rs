// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

use crate::core::{Direction, GpioPin, I2CDevice, Level};
use crate::ffi::{self, LineRequestFlags};
use log::{debug, trace};
use std::fs::{File, OpenOptions};
use std::io;
use std::io::prelude::*;
use std::os::unix::prelude::*;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors from the Linux i2c-dev and gpio-cdev backends
#[derive(Debug, Error)]
pub enum LinuxError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("ioctl failed: {0}")]
    Nix(#[from] nix::Error),
    #[error("GPIO {pin} is not available on this board (valid: 0..{count})")]
    InvalidPin { pin: u32, count: u32 },
}

impl embedded_hal::digital::Error for LinuxError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

pub struct LinuxI2CDevice {
    devfile: File,
    slave_address: u16,
}

impl AsRawFd for LinuxI2CDevice {
    fn as_raw_fd(&self) -> RawFd {
        self.devfile.as_raw_fd()
    }
}

impl LinuxI2CDevice {
    /// Create a new I2CDevice for the specified path
    pub fn new<P: AsRef<Path>>(path: P, slave_address: u16) -> Result<LinuxI2CDevice, LinuxError> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        let mut device = LinuxI2CDevice {
            devfile: file,
            slave_address: 0, // will be set later
        };
        device.set_slave_address(slave_address)?;
        debug!(
            "opened {} for slave 0x{:02x}",
            path.as_ref().display(),
            slave_address
        );
        Ok(device)
    }

    /// Set the slave address for this device
    ///
    /// Typically the address is expected to be 7-bits.  Little validation
    /// is done here as the kernel is good at making sure things are valid.
    pub fn set_slave_address(&mut self, slave_address: u16) -> Result<(), LinuxError> {
        ffi::i2c_set_slave_address(self.as_raw_fd(), slave_address)?;
        self.slave_address = slave_address;
        Ok(())
    }

    pub fn slave_address(&self) -> u16 {
        self.slave_address
    }
}

impl I2CDevice for LinuxI2CDevice {
    type Error = LinuxError;

    fn read(&mut self, data: &mut [u8]) -> Result<(), LinuxError> {
        self.devfile.read(data).map(drop).map_err(From::from)
    }

    fn write(&mut self, data: &[u8]) -> Result<(), LinuxError> {
        self.devfile.write(data).map(drop).map_err(From::from)
    }

    fn smbus_read_byte(&mut self) -> Result<u8, LinuxError> {
        ffi::i2c_smbus_read_byte(self.as_raw_fd()).map_err(From::from)
    }

    fn smbus_write_byte(&mut self, value: u8) -> Result<(), LinuxError> {
        ffi::i2c_smbus_write_byte(self.as_raw_fd(), value).map_err(From::from)
    }

    fn smbus_read_byte_data(&mut self, register: u8) -> Result<u8, LinuxError> {
        ffi::i2c_smbus_read_byte_data(self.as_raw_fd(), register).map_err(From::from)
    }

    fn smbus_write_byte_data(&mut self, register: u8, value: u8) -> Result<(), LinuxError> {
        ffi::i2c_smbus_write_byte_data(self.as_raw_fd(), register, value).map_err(From::from)
    }

    fn smbus_read_word_data(&mut self, register: u8) -> Result<u16, LinuxError> {
        ffi::i2c_smbus_read_word_data(self.as_raw_fd(), register).map_err(From::from)
    }

    fn smbus_write_word_data(&mut self, register: u8, value: u16) -> Result<(), LinuxError> {
        ffi::i2c_smbus_write_word_data(self.as_raw_fd(), register, value).map_err(From::from)
    }

    fn smbus_read_i2c_block_data(&mut self, register: u8, len: u8) -> Result<Vec<u8>, LinuxError> {
        ffi::i2c_smbus_read_i2c_block_data(self.as_raw_fd(), register, len).map_err(From::from)
    }

    fn smbus_write_i2c_block_data(&mut self, register: u8, values: &[u8]) -> Result<(), LinuxError> {
        ffi::i2c_smbus_write_i2c_block_data(self.as_raw_fd(), register, values).map_err(From::from)
    }
}

/// A GPIO controller exposed as `/dev/gpiochipN`
///
/// The chip file stays open for as long as any line requested from it is
/// alive, since lines re-request their handle on direction changes.
pub struct LinuxGpioChip {
    chip: Arc<File>,
}

impl LinuxGpioChip {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<LinuxGpioChip, LinuxError> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        debug!("opened GPIO chip {}", path.as_ref().display());
        Ok(LinuxGpioChip {
            chip: Arc::new(file),
        })
    }

    /// Request exclusive use of the line at `offset`
    ///
    /// Output lines start driven low.
    pub fn request_line(
        &self,
        offset: u32,
        direction: Direction,
        consumer: &str,
    ) -> Result<LinuxGpioLine, LinuxError> {
        let handle = request_handle(&self.chip, offset, direction, Level::Low, consumer)?;
        Ok(LinuxGpioLine {
            chip: Arc::clone(&self.chip),
            handle: Some(handle),
            offset,
            direction,
            consumer: consumer.to_owned(),
            last_written: Level::Low,
        })
    }
}

fn request_handle(
    chip: &File,
    offset: u32,
    direction: Direction,
    initial: Level,
    consumer: &str,
) -> Result<File, LinuxError> {
    let flags = match direction {
        Direction::Input => LineRequestFlags::INPUT,
        Direction::Output => LineRequestFlags::OUTPUT,
    };
    let fd = ffi::gpio_request_line(chip.as_raw_fd(), offset, flags, initial as u8, consumer)?;
    // the kernel hands us a fresh descriptor that nothing else owns
    Ok(unsafe { File::from_raw_fd(fd) })
}

/// One line of a [`LinuxGpioChip`]
pub struct LinuxGpioLine {
    chip: Arc<File>,
    handle: Option<File>,
    offset: u32,
    direction: Direction,
    consumer: String,
    last_written: Level,
}

impl LinuxGpioLine {
    pub fn offset(&self) -> u32 {
        self.offset
    }

    fn handle_fd(&self) -> Result<RawFd, LinuxError> {
        match self.handle {
            Some(ref handle) => Ok(handle.as_raw_fd()),
            None => Err(LinuxError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                "line handle was released by a failed direction change",
            ))),
        }
    }
}

impl GpioPin for LinuxGpioLine {
    type Error = LinuxError;

    fn set_direction(&mut self, direction: Direction) -> Result<(), LinuxError> {
        if direction == self.direction {
            return Ok(());
        }
        // the v1 ABI fixes the direction at request time, so the old handle
        // has to be released before the line can be requested again
        self.handle = None;
        self.handle = Some(request_handle(
            &self.chip,
            self.offset,
            direction,
            self.last_written,
            &self.consumer,
        )?);
        self.direction = direction;
        trace!("GPIO {} reconfigured as {:?}", self.offset, direction);
        Ok(())
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn read(&mut self) -> Result<Level, LinuxError> {
        let value = ffi::gpio_get_value(self.handle_fd()?)?;
        Ok(Level::from(value != 0))
    }

    fn write(&mut self, level: Level) -> Result<(), LinuxError> {
        ffi::gpio_set_value(self.handle_fd()?, level as u8)?;
        self.last_written = level;
        Ok(())
    }
}

impl embedded_hal::digital::ErrorType for LinuxGpioLine {
    type Error = LinuxError;
}

impl embedded_hal::digital::OutputPin for LinuxGpioLine {
    fn set_low(&mut self) -> Result<(), LinuxError> {
        GpioPin::write(self, Level::Low)
    }

    fn set_high(&mut self) -> Result<(), LinuxError> {
        GpioPin::write(self, Level::High)
    }
}

impl embedded_hal::digital::InputPin for LinuxGpioLine {
    fn is_high(&mut self) -> Result<bool, LinuxError> {
        GpioPin::is_high(self)
    }

    fn is_low(&mut self) -> Result<bool, LinuxError> {
        GpioPin::is_low(self)
    }
}
