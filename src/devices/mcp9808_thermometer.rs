// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! Microchip MCP9808 digital temperature sensor

#![allow(dead_code)] // register map

use crate::core::I2CDevice;
use crate::devices::Thermometer;
use crate::error::{check_len, DeviceError};
use byteorder::{BigEndian, ByteOrder};
use log::debug;

pub const MCP9808_I2C_ADDR: u16 = 0x18;
pub const MANUFACTURER_ID: u16 = 0x0054;

const REGISTER_CONFIG: u8 = 0x01;
const REGISTER_ALERT_UPPER: u8 = 0x02;
const REGISTER_ALERT_LOWER: u8 = 0x03;
const REGISTER_CRITICAL: u8 = 0x04;
const REGISTER_AMBIENT: u8 = 0x05;
const REGISTER_MANUFACTURER_ID: u8 = 0x06;
const REGISTER_DEVICE_ID: u8 = 0x07;
const REGISTER_RESOLUTION: u8 = 0x08;

const CONFIG_SHUTDOWN: u16 = 0x0100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// 0.5C, 30ms conversions
    Half = 0,
    /// 0.25C, 65ms conversions
    Quarter = 1,
    /// 0.125C, 130ms conversions
    Eighth = 2,
    /// 0.0625C, 250ms conversions (power-on default)
    Sixteenth = 3,
}

/// Temperature from the ambient temperature register
///
/// The low 13 bits hold a two's complement value in 1/16 degrees; the top
/// three bits are alert flags.
pub fn convert_ambient(raw: u16) -> f32 {
    let upper = ((raw >> 8) & 0x1F) as u8;
    let lower = (raw & 0xFF) as u8;
    let magnitude = f32::from(upper & 0x0F) * 16.0 + f32::from(lower) / 16.0;
    if upper & 0x10 != 0 {
        magnitude - 256.0
    } else {
        magnitude
    }
}

pub struct Mcp9808<T: I2CDevice + Sized> {
    i2cdev: T,
}

impl<T> Mcp9808<T>
where
    T: I2CDevice + Sized,
{
    pub fn new(i2cdev: T) -> Mcp9808<T> {
        Mcp9808 { i2cdev }
    }

    fn read_register(&mut self, register: u8) -> Result<u16, DeviceError<T::Error>> {
        let buf = self.i2cdev.smbus_read_i2c_block_data(register, 2)?;
        check_len::<T::Error>(&buf, 2)?;
        Ok(BigEndian::read_u16(&buf))
    }

    fn write_register(&mut self, register: u8, value: u16) -> Result<(), DeviceError<T::Error>> {
        let mut buf = [0_u8; 2];
        BigEndian::write_u16(&mut buf, value);
        self.i2cdev.smbus_write_i2c_block_data(register, &buf)?;
        Ok(())
    }

    /// Should read back as 0x0054
    pub fn manufacturer_id(&mut self) -> Result<u16, DeviceError<T::Error>> {
        self.read_register(REGISTER_MANUFACTURER_ID)
    }

    /// Device id in the high byte, revision in the low byte
    pub fn device_id(&mut self) -> Result<u16, DeviceError<T::Error>> {
        self.read_register(REGISTER_DEVICE_ID)
    }

    pub fn set_resolution(&mut self, resolution: Resolution) -> Result<(), DeviceError<T::Error>> {
        debug!("MCP9808 resolution set to {:?}", resolution);
        self.i2cdev
            .smbus_write_byte_data(REGISTER_RESOLUTION, resolution as u8)?;
        Ok(())
    }

    /// Put the sensor in low power shutdown, or bring it back
    pub fn set_shutdown(&mut self, shutdown: bool) -> Result<(), DeviceError<T::Error>> {
        let config = self.read_register(REGISTER_CONFIG)?;
        let config = if shutdown {
            config | CONFIG_SHUTDOWN
        } else {
            config & !CONFIG_SHUTDOWN
        };
        self.write_register(REGISTER_CONFIG, config)
    }

    pub fn read_temperature(&mut self) -> Result<f32, DeviceError<T::Error>> {
        Ok(convert_ambient(self.read_register(REGISTER_AMBIENT)?))
    }

    pub fn release(self) -> T {
        self.i2cdev
    }
}

impl<T> Thermometer for Mcp9808<T>
where
    T: I2CDevice + Sized,
    T::Error: 'static,
{
    type Error = DeviceError<T::Error>;

    fn temperature_celsius(&mut self) -> Result<f32, Self::Error> {
        self.read_temperature()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockI2CDevice;

    #[test]
    fn test_convert_ambient() {
        assert_eq!(convert_ambient(0xC190), 25.0);
        assert_eq!(convert_ambient(0x0014), 1.25);
        // sign bit set
        assert_eq!(convert_ambient(0x1FF0), -1.0);
    }

    #[test]
    fn test_read_temperature() {
        let mut dev = MockI2CDevice::new();
        dev.regmap.write_regs(REGISTER_AMBIENT as usize, &[0x01, 0x94]);
        let mut sensor = Mcp9808::new(dev);
        assert_eq!(sensor.temperature_celsius().unwrap(), 25.25);
    }

    #[test]
    fn test_ids() {
        // the mock addresses bytes, so adjacent 16 bit registers overlap
        let mut dev = MockI2CDevice::new();
        dev.regmap.write_regs(REGISTER_MANUFACTURER_ID as usize, &[0x00, 0x54]);
        let mut sensor = Mcp9808::new(dev);
        assert_eq!(sensor.manufacturer_id().unwrap(), MANUFACTURER_ID);

        let mut dev = MockI2CDevice::new();
        dev.regmap.write_regs(REGISTER_DEVICE_ID as usize, &[0x04, 0x00]);
        let mut sensor = Mcp9808::new(dev);
        assert_eq!(sensor.device_id().unwrap(), 0x0400);
    }

    #[test]
    fn test_resolution_and_shutdown() {
        let mut sensor = Mcp9808::new(MockI2CDevice::new());
        sensor.set_resolution(Resolution::Quarter).unwrap();
        sensor.set_shutdown(true).unwrap();
        let dev = sensor.release();
        assert_eq!(dev.regmap.reg(REGISTER_RESOLUTION), 1);
        assert_eq!(dev.regmap.read_regs(REGISTER_CONFIG as usize, 2), vec![0x01, 0x00]);
    }
}
