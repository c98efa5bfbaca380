// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! Rohm BH1750 ambient light sensor
//!
//! The chip has no registers; every instruction is a single opcode byte
//! and a measurement is read back as a big endian 16-bit count.

use crate::core::I2CDevice;
use crate::devices::LightSensor;
use crate::error::{check_range, DeviceError};
use crate::timing;
use byteorder::{BigEndian, ByteOrder};
use log::debug;
use std::time::Duration;

pub const BH1750_I2C_ADDR: u16 = 0x23;
pub const BH1750_I2C_ADDR_ALT: u16 = 0x5C;

const CMD_POWER_DOWN: u8 = 0x00;
const CMD_POWER_ON: u8 = 0x01;
const CMD_RESET: u8 = 0x07;
const CMD_MEASUREMENT_TIME_HIGH: u8 = 0x40;
const CMD_MEASUREMENT_TIME_LOW: u8 = 0x60;

pub const DEFAULT_MEASUREMENT_TIME: u8 = 69;
pub const MIN_MEASUREMENT_TIME: u8 = 31;
pub const MAX_MEASUREMENT_TIME: u8 = 254;

/// Counts per lux at the default measurement time
const COUNTS_PER_LUX: f32 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// 1 lx resolution, measuring repeatedly
    ContinuousHigh = 0x10,
    /// 0.5 lx resolution, measuring repeatedly
    ContinuousHigh2 = 0x11,
    /// 4 lx resolution, measuring repeatedly
    ContinuousLow = 0x13,
    /// 1 lx resolution, one measurement then power down
    OneTimeHigh = 0x20,
    /// 0.5 lx resolution, one measurement then power down
    OneTimeHigh2 = 0x21,
    /// 4 lx resolution, one measurement then power down
    OneTimeLow = 0x23,
}

impl Mode {
    /// Worst case conversion time at the default measurement time
    pub fn measurement_delay(self) -> Duration {
        match self {
            Mode::ContinuousLow | Mode::OneTimeLow => Duration::from_millis(24),
            _ => Duration::from_millis(180),
        }
    }

    pub fn is_continuous(self) -> bool {
        (self as u8) & 0x20 == 0
    }

    fn half_lux(self) -> bool {
        match self {
            Mode::ContinuousHigh2 | Mode::OneTimeHigh2 => true,
            _ => false,
        }
    }
}

/// Lux from a raw count
pub fn convert_lux(raw: u16, mode: Mode, measurement_time: u8) -> f32 {
    let mut lux = f32::from(raw) / COUNTS_PER_LUX;
    lux *= f32::from(DEFAULT_MEASUREMENT_TIME) / f32::from(measurement_time);
    if mode.half_lux() {
        lux /= 2.0;
    }
    lux
}

pub struct Bh1750<T: I2CDevice + Sized> {
    i2cdev: T,
    mode: Mode,
    measurement_time: u8,
    // continuous mode the chip is currently running, if any
    running: Option<Mode>,
}

impl<T> Bh1750<T>
where
    T: I2CDevice + Sized,
{
    pub fn new(mut i2cdev: T, mode: Mode) -> Result<Bh1750<T>, DeviceError<T::Error>> {
        i2cdev.smbus_write_byte(CMD_POWER_ON)?;
        debug!("BH1750 powered on in {:?} mode", mode);
        Ok(Bh1750 {
            i2cdev,
            mode,
            measurement_time: DEFAULT_MEASUREMENT_TIME,
            running: None,
        })
    }

    pub fn power_on(&mut self) -> Result<(), DeviceError<T::Error>> {
        self.i2cdev.smbus_write_byte(CMD_POWER_ON)?;
        Ok(())
    }

    pub fn power_down(&mut self) -> Result<(), DeviceError<T::Error>> {
        self.i2cdev.smbus_write_byte(CMD_POWER_DOWN)?;
        self.running = None;
        Ok(())
    }

    /// Clear the data register; only accepted while powered on
    pub fn reset(&mut self) -> Result<(), DeviceError<T::Error>> {
        self.power_on()?;
        self.i2cdev.smbus_write_byte(CMD_RESET)?;
        Ok(())
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Change the sensitivity; longer measurement times see dimmer light
    pub fn set_measurement_time(&mut self, measurement_time: u8) -> Result<(), DeviceError<T::Error>> {
        check_range::<T::Error, _>(
            "measurement time",
            measurement_time,
            MIN_MEASUREMENT_TIME,
            MAX_MEASUREMENT_TIME,
        )?;
        self.i2cdev
            .smbus_write_byte(CMD_MEASUREMENT_TIME_HIGH | (measurement_time >> 5))?;
        self.i2cdev
            .smbus_write_byte(CMD_MEASUREMENT_TIME_LOW | (measurement_time & 0x1F))?;
        self.measurement_time = measurement_time;
        debug!("BH1750 measurement time set to {}", measurement_time);
        Ok(())
    }

    fn delay(&self, mode: Mode) -> Duration {
        let scaled = mode.measurement_delay().as_micros() as u64 * u64::from(self.measurement_time)
            / u64::from(DEFAULT_MEASUREMENT_TIME);
        Duration::from_micros(scaled)
    }

    /// Take a raw reading in `mode`
    ///
    /// A continuous mode is only started once; later calls read the latest
    /// result without waiting.
    pub fn measure_raw(&mut self, mode: Mode) -> Result<u16, DeviceError<T::Error>> {
        if self.running != Some(mode) {
            self.i2cdev.smbus_write_byte(mode as u8)?;
            timing::delay(self.delay(mode));
            self.running = if mode.is_continuous() { Some(mode) } else { None };
        }
        let mut buf = [0_u8; 2];
        self.i2cdev.read(&mut buf)?;
        Ok(BigEndian::read_u16(&buf))
    }

    pub fn measure(&mut self, mode: Mode) -> Result<f32, DeviceError<T::Error>> {
        let raw = self.measure_raw(mode)?;
        Ok(convert_lux(raw, mode, self.measurement_time))
    }

    pub fn release(self) -> T {
        self.i2cdev
    }
}

impl<T> LightSensor for Bh1750<T>
where
    T: I2CDevice + Sized,
    T::Error: 'static,
{
    type Error = DeviceError<T::Error>;

    fn lux(&mut self) -> Result<f32, Self::Error> {
        let mode = self.mode;
        self.measure(mode)
    }
}
