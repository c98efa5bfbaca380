// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! NXP PCF8591 4-channel 8-bit ADC with a single 8-bit DAC output

use crate::core::I2CDevice;
use crate::devices::{AnalogInput, AnalogOutput};
use crate::error::{check_range, DeviceError};

pub const PCF8591_I2C_ADDR: u16 = 0x48;
pub const CHANNEL_COUNT: u8 = 4;

const CONTROL_OUTPUT_ENABLE: u8 = 0x40;

pub struct Pcf8591<T: I2CDevice + Sized> {
    i2cdev: T,
    output_enabled: bool,
    output_value: u8,
}

impl<T> Pcf8591<T>
where
    T: I2CDevice + Sized,
{
    pub fn new(i2cdev: T) -> Pcf8591<T> {
        Pcf8591 {
            i2cdev,
            output_enabled: false,
            output_value: 0,
        }
    }

    fn control_byte(&self, channel: u8) -> u8 {
        let enable = if self.output_enabled {
            CONTROL_OUTPUT_ENABLE
        } else {
            0
        };
        enable | (channel & 0x03)
    }

    /// Convert one input channel (0-3)
    pub fn read(&mut self, channel: u8) -> Result<u8, DeviceError<T::Error>> {
        check_range::<T::Error, _>("channel", channel, 0, CHANNEL_COUNT - 1)?;
        let control = self.control_byte(channel);
        self.i2cdev.write(&[control])?;
        // the first byte is the result of the previous conversion
        let mut buf = [0_u8; 2];
        self.i2cdev.read(&mut buf)?;
        Ok(buf[1])
    }

    /// Enable the analog output and drive it to `value`
    pub fn write_output(&mut self, value: u8) -> Result<(), DeviceError<T::Error>> {
        self.output_enabled = true;
        self.output_value = value;
        let control = self.control_byte(0);
        self.i2cdev.write(&[control, value])?;
        Ok(())
    }

    /// Switch the analog output off
    pub fn disable_output(&mut self) -> Result<(), DeviceError<T::Error>> {
        self.output_enabled = false;
        let control = self.control_byte(0);
        self.i2cdev.write(&[control])?;
        Ok(())
    }

    /// Last value written to the output, if enabled
    pub fn output(&self) -> Option<u8> {
        if self.output_enabled {
            Some(self.output_value)
        } else {
            None
        }
    }

    pub fn release(self) -> T {
        self.i2cdev
    }
}

impl<T> AnalogInput for Pcf8591<T>
where
    T: I2CDevice + Sized,
    T::Error: 'static,
{
    type Error = DeviceError<T::Error>;

    fn channel_count(&self) -> u8 {
        CHANNEL_COUNT
    }

    fn resolution_bits(&self) -> u8 {
        8
    }

    fn read_channel(&mut self, channel: u8) -> Result<u16, Self::Error> {
        self.read(channel).map(u16::from)
    }
}

impl<T> AnalogOutput for Pcf8591<T>
where
    T: I2CDevice + Sized,
    T::Error: 'static,
{
    type Error = DeviceError<T::Error>;

    fn channel_count(&self) -> u8 {
        1
    }

    fn resolution_bits(&self) -> u8 {
        8
    }

    fn write_channel(&mut self, channel: u8, value: u16) -> Result<(), Self::Error> {
        check_range::<T::Error, _>("channel", channel, 0, 0)?;
        check_range::<T::Error, _>("output value", value, 0, 255)?;
        self.write_output(value as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockI2CDevice;

    #[test]
    fn test_read_discards_stale_byte() {
        let mut dev = MockI2CDevice::new();
        // control byte 0x02 selects channel 2; the mock serves the two
        // bytes following that offset
        dev.regmap.write_regs(0x02, &[0x11, 0x80]);
        let mut adc = Pcf8591::new(dev);
        assert_eq!(adc.read(2).unwrap(), 0x80);
    }

    #[test]
    fn test_output_keeps_enable_bit() {
        let mut adc = Pcf8591::new(MockI2CDevice::new());
        adc.write_output(200).unwrap();
        assert_eq!(adc.output(), Some(200));
        adc.read(1).unwrap();
        let dev = adc.release();
        assert_eq!(dev.writes[0], vec![0x40, 200]);
        assert_eq!(dev.writes[1], vec![0x41]);
    }

    #[test]
    fn test_disable_output() {
        let mut adc = Pcf8591::new(MockI2CDevice::new());
        adc.write_output(10).unwrap();
        adc.disable_output().unwrap();
        assert_eq!(adc.output(), None);
        assert_eq!(adc.release().last_write(), Some(&[0x00][..]));
    }

    #[test]
    fn test_rejects_bad_channel() {
        let mut adc = Pcf8591::new(MockI2CDevice::new());
        assert!(adc.read(4).is_err());
        assert!(adc.write_channel(0, 256).is_err());
    }
}
