// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! Maxim DS1307 real-time clock with 56 bytes of battery backed RAM
//!
//! Time is kept in BCD registers 0x00-0x06.  Bit 7 of the seconds
//! register is the clock halt flag; a new chip powers up halted.

use crate::core::{I2CDevice, Level};
use crate::error::{check_len, check_range, DeviceError};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use log::debug;

pub const DS1307_I2C_ADDR: u16 = 0x68;

const REGISTER_SECONDS: u8 = 0x00;
const REGISTER_CONTROL: u8 = 0x07;
const REGISTER_RAM: u8 = 0x08;
const TIME_REGISTER_COUNT: usize = 7;

pub const RAM_SIZE: u8 = 56;
/// Largest transfer the i2c-dev block calls accept
const BLOCK_SIZE: usize = 32;

const CLOCK_HALT: u8 = 0x80;
const HOUR_12H_MODE: u8 = 0x40;
const HOUR_PM: u8 = 0x20;

const CONTROL_OUT: u8 = 0x80;
const CONTROL_SQWE: u8 = 0x10;

/// Binary-coded decimal for 0-99
pub fn bcd_encode(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

pub fn bcd_decode(bcd: u8) -> u8 {
    (bcd >> 4) * 10 + (bcd & 0x0F)
}

/// Calendar time in 24-hour format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    /// 1-7; which day counts as the first is up to the application
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTime {
    /// Check every field is within the range the chip can store
    pub fn validate<E>(&self) -> Result<(), DeviceError<E>> {
        // two digit year register
        check_range::<E, _>("year", self.year, 2000, 2099)?;
        check_range::<E, _>("weekday", self.weekday, 1, 7)?;
        if self.date().is_none() {
            return Err(DeviceError::InvalidConfig("not a calendar date"));
        }
        if self.time().is_none() {
            return Err(DeviceError::InvalidConfig("not a time of day"));
        }
        Ok(())
    }

    fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )
    }

    fn time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
        )
    }

    /// `None` if the fields do not name a real date and time
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        Some(NaiveDateTime::new(self.date()?, self.time()?))
    }

    /// Split a chrono timestamp into clock fields, numbering weekdays
    /// from Monday = 1
    pub fn from_naive(datetime: &NaiveDateTime) -> DateTime {
        DateTime {
            year: datetime.year() as u16,
            month: datetime.month() as u8,
            day: datetime.day() as u8,
            weekday: datetime.weekday().number_from_monday() as u8,
            hour: datetime.hour() as u8,
            minute: datetime.minute() as u8,
            second: datetime.second() as u8,
        }
    }

    fn to_registers(&self) -> [u8; TIME_REGISTER_COUNT] {
        [
            bcd_encode(self.second),
            bcd_encode(self.minute),
            bcd_encode(self.hour),
            self.weekday,
            bcd_encode(self.day),
            bcd_encode(self.month),
            bcd_encode((self.year - 2000) as u8),
        ]
    }

    fn from_registers(regs: &[u8]) -> DateTime {
        let hour = if regs[2] & HOUR_12H_MODE != 0 {
            let hour12 = bcd_decode(regs[2] & 0x1F) % 12;
            if regs[2] & HOUR_PM != 0 {
                hour12 + 12
            } else {
                hour12
            }
        } else {
            bcd_decode(regs[2] & 0x3F)
        };
        DateTime {
            second: bcd_decode(regs[0] & !CLOCK_HALT),
            minute: bcd_decode(regs[1] & 0x7F),
            hour,
            weekday: regs[3] & 0x07,
            day: bcd_decode(regs[4] & 0x3F),
            month: bcd_decode(regs[5] & 0x1F),
            year: 2000 + u16::from(bcd_decode(regs[6])),
        }
    }
}

/// Behaviour of the SQW/OUT pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquareWave {
    /// Oscillator output off, pin held at the given level
    Disabled(Level),
    Hz1,
    Hz4096,
    Hz8192,
    Hz32768,
}

impl SquareWave {
    fn control_byte(self) -> u8 {
        match self {
            SquareWave::Disabled(Level::Low) => 0,
            SquareWave::Disabled(Level::High) => CONTROL_OUT,
            SquareWave::Hz1 => CONTROL_SQWE,
            SquareWave::Hz4096 => CONTROL_SQWE | 0x01,
            SquareWave::Hz8192 => CONTROL_SQWE | 0x02,
            SquareWave::Hz32768 => CONTROL_SQWE | 0x03,
        }
    }
}

pub struct Ds1307<T: I2CDevice + Sized> {
    i2cdev: T,
}

impl<T> Ds1307<T>
where
    T: I2CDevice + Sized,
{
    pub fn new(i2cdev: T) -> Ds1307<T> {
        Ds1307 { i2cdev }
    }

    pub fn read_datetime(&mut self) -> Result<DateTime, DeviceError<T::Error>> {
        let regs = self
            .i2cdev
            .smbus_read_i2c_block_data(REGISTER_SECONDS, TIME_REGISTER_COUNT as u8)?;
        check_len::<T::Error>(&regs, TIME_REGISTER_COUNT)?;
        Ok(DateTime::from_registers(&regs))
    }

    /// Set the clock; this also starts it if it was halted
    pub fn set_datetime(&mut self, datetime: &DateTime) -> Result<(), DeviceError<T::Error>> {
        datetime.validate::<T::Error>()?;
        self.i2cdev
            .smbus_write_i2c_block_data(REGISTER_SECONDS, &datetime.to_registers())?;
        debug!("DS1307 set to {:?}", datetime);
        Ok(())
    }

    pub fn is_running(&mut self) -> Result<bool, DeviceError<T::Error>> {
        let seconds = self.i2cdev.smbus_read_byte_data(REGISTER_SECONDS)?;
        Ok(seconds & CLOCK_HALT == 0)
    }

    /// Start or halt the oscillator, keeping the seconds count
    pub fn set_running(&mut self, running: bool) -> Result<(), DeviceError<T::Error>> {
        let seconds = self.i2cdev.smbus_read_byte_data(REGISTER_SECONDS)?;
        let seconds = if running {
            seconds & !CLOCK_HALT
        } else {
            seconds | CLOCK_HALT
        };
        self.i2cdev
            .smbus_write_byte_data(REGISTER_SECONDS, seconds)?;
        Ok(())
    }

    pub fn set_square_wave(&mut self, output: SquareWave) -> Result<(), DeviceError<T::Error>> {
        self.i2cdev
            .smbus_write_byte_data(REGISTER_CONTROL, output.control_byte())?;
        Ok(())
    }

    fn check_ram(&self, offset: u8, len: usize) -> Result<(), DeviceError<T::Error>> {
        check_range::<T::Error, _>("RAM offset", offset, 0, RAM_SIZE - 1)?;
        let end = i64::from(offset) + len as i64;
        check_range::<T::Error, _>("RAM end", end, 0, i64::from(RAM_SIZE))
    }

    /// Read `buf.len()` bytes of RAM starting at `offset` (0-55)
    pub fn read_ram(&mut self, offset: u8, buf: &mut [u8]) -> Result<(), DeviceError<T::Error>> {
        self.check_ram(offset, buf.len())?;
        for (i, chunk) in buf.chunks_mut(BLOCK_SIZE).enumerate() {
            let register = REGISTER_RAM + offset + (i * BLOCK_SIZE) as u8;
            let data = self
                .i2cdev
                .smbus_read_i2c_block_data(register, chunk.len() as u8)?;
            check_len::<T::Error>(&data, chunk.len())?;
            let len = chunk.len();
            chunk.copy_from_slice(&data[..len]);
        }
        Ok(())
    }

    /// Write `data` to RAM starting at `offset` (0-55)
    pub fn write_ram(&mut self, offset: u8, data: &[u8]) -> Result<(), DeviceError<T::Error>> {
        self.check_ram(offset, data.len())?;
        for (i, chunk) in data.chunks(BLOCK_SIZE).enumerate() {
            let register = REGISTER_RAM + offset + (i * BLOCK_SIZE) as u8;
            self.i2cdev.smbus_write_i2c_block_data(register, chunk)?;
        }
        Ok(())
    }

    pub fn release(self) -> T {
        self.i2cdev
    }
}
