// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! Microchip MCP4725 single channel 12-bit DAC with EEPROM

use crate::core::I2CDevice;
use crate::devices::AnalogOutput;
use crate::error::{check_range, DeviceError};
use log::debug;

pub const MCP4725_I2C_ADDR: u16 = 0x62;
pub const MAX_VALUE: u16 = 4095;

const CMD_WRITE_DAC: u8 = 0x40;
const CMD_WRITE_DAC_EEPROM: u8 = 0x60;

/// Output state while powered down; the DAC is disconnected from the pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerDown {
    Normal = 0,
    Pulldown1K = 1,
    Pulldown100K = 2,
    Pulldown500K = 3,
}

impl PowerDown {
    fn from_bits(bits: u8) -> PowerDown {
        match bits & 0b11 {
            0 => PowerDown::Normal,
            1 => PowerDown::Pulldown1K,
            2 => PowerDown::Pulldown100K,
            _ => PowerDown::Pulldown500K,
        }
    }
}

/// Contents of the DAC register and EEPROM as read back from the chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mcp4725State {
    pub eeprom_busy: bool,
    pub power_down: PowerDown,
    pub value: u16,
    pub eeprom_power_down: PowerDown,
    pub eeprom_value: u16,
}

impl Mcp4725State {
    fn from_data(data: &[u8; 5]) -> Mcp4725State {
        Mcp4725State {
            // RDY bit is high once an EEPROM write completes
            eeprom_busy: data[0] & 0x80 == 0,
            power_down: PowerDown::from_bits(data[0] >> 1),
            value: (u16::from(data[1]) << 4) | (u16::from(data[2]) >> 4),
            eeprom_power_down: PowerDown::from_bits(data[3] >> 5),
            eeprom_value: (u16::from(data[3] & 0x0F) << 8) | u16::from(data[4]),
        }
    }
}

pub struct Mcp4725<T: I2CDevice + Sized> {
    i2cdev: T,
}

impl<T> Mcp4725<T>
where
    T: I2CDevice + Sized,
{
    pub fn new(i2cdev: T) -> Mcp4725<T> {
        Mcp4725 { i2cdev }
    }

    /// Set the output using the two byte fast-write command
    pub fn set_value(&mut self, value: u16) -> Result<(), DeviceError<T::Error>> {
        check_range::<T::Error, _>("DAC value", value, 0, MAX_VALUE)?;
        self.i2cdev.write(&[(value >> 8) as u8 & 0x0F, (value & 0xFF) as u8])?;
        Ok(())
    }

    /// Set the output and store it in EEPROM as the power-on value
    pub fn set_value_persistent(&mut self, value: u16) -> Result<(), DeviceError<T::Error>> {
        check_range::<T::Error, _>("DAC value", value, 0, MAX_VALUE)?;
        debug!("MCP4725 storing {} in EEPROM", value);
        self.i2cdev.write(&[
            CMD_WRITE_DAC_EEPROM,
            (value >> 4) as u8,
            ((value & 0x0F) << 4) as u8,
        ])?;
        Ok(())
    }

    /// Power the output stage down (or back up with `PowerDown::Normal`)
    pub fn set_power_down(&mut self, mode: PowerDown) -> Result<(), DeviceError<T::Error>> {
        let value = self.read_state()?.value;
        self.i2cdev.write(&[
            CMD_WRITE_DAC | ((mode as u8) << 1),
            (value >> 4) as u8,
            ((value & 0x0F) << 4) as u8,
        ])?;
        Ok(())
    }

    pub fn read_state(&mut self) -> Result<Mcp4725State, DeviceError<T::Error>> {
        let mut buf = [0_u8; 5];
        self.i2cdev.read(&mut buf)?;
        Ok(Mcp4725State::from_data(&buf))
    }

    pub fn release(self) -> T {
        self.i2cdev
    }
}

impl<T> AnalogOutput for Mcp4725<T>
where
    T: I2CDevice + Sized,
    T::Error: 'static,
{
    type Error = DeviceError<T::Error>;

    fn channel_count(&self) -> u8 {
        1
    }

    fn resolution_bits(&self) -> u8 {
        12
    }

    fn write_channel(&mut self, channel: u8, value: u16) -> Result<(), Self::Error> {
        check_range::<T::Error, _>("channel", channel, 0, 0)?;
        self.set_value(value)
    }
}
