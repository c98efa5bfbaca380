// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! Holtek HT16K33 16x8 LED matrix driver
//!
//! Display RAM is 8 rows of 16 bits.  Changes are made to a local buffer
//! and only sent to the chip by [`Ht16k33::write_display`].

use crate::core::I2CDevice;
use crate::error::{check_range, DeviceError};
use log::debug;

pub const HT16K33_I2C_ADDR: u16 = 0x70;

const CMD_SYSTEM_SETUP: u8 = 0x20;
const OSCILLATOR_ON: u8 = 0x01;
const CMD_DISPLAY_SETUP: u8 = 0x80;
const DISPLAY_ON: u8 = 0x01;
const CMD_BRIGHTNESS: u8 = 0xE0;
const REGISTER_DISPLAY_RAM: u8 = 0x00;

pub const MAX_BRIGHTNESS: u8 = 15;
pub const ROW_COUNT: u8 = 8;
pub const LED_COUNT: u8 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkRate {
    Off = 0,
    TwoHz = 1,
    OneHz = 2,
    HalfHz = 3,
}

pub struct Ht16k33<T: I2CDevice + Sized> {
    i2cdev: T,
    buffer: [u16; ROW_COUNT as usize],
}

impl<T> Ht16k33<T>
where
    T: I2CDevice + Sized,
{
    /// Start the oscillator and turn the display on at full brightness
    pub fn new(mut i2cdev: T) -> Result<Ht16k33<T>, DeviceError<T::Error>> {
        i2cdev.smbus_write_byte(CMD_SYSTEM_SETUP | OSCILLATOR_ON)?;
        let mut display = Ht16k33 {
            i2cdev,
            buffer: [0; ROW_COUNT as usize],
        };
        display.set_blink_rate(BlinkRate::Off)?;
        display.set_brightness(MAX_BRIGHTNESS)?;
        debug!("HT16K33 initialised");
        Ok(display)
    }

    /// Set the dimming level, 0 (dimmest) through 15
    pub fn set_brightness(&mut self, brightness: u8) -> Result<(), DeviceError<T::Error>> {
        check_range::<T::Error, _>("brightness", brightness, 0, MAX_BRIGHTNESS)?;
        self.i2cdev.smbus_write_byte(CMD_BRIGHTNESS | brightness)?;
        Ok(())
    }

    pub fn set_blink_rate(&mut self, rate: BlinkRate) -> Result<(), DeviceError<T::Error>> {
        self.i2cdev
            .smbus_write_byte(CMD_DISPLAY_SETUP | DISPLAY_ON | ((rate as u8) << 1))?;
        Ok(())
    }

    /// Set one LED in the buffer; LEDs are numbered row by row, 16 per row
    pub fn set_led(&mut self, led: u8, on: bool) -> Result<(), DeviceError<T::Error>> {
        check_range::<T::Error, _>("LED", led, 0, LED_COUNT - 1)?;
        let row = (led / 16) as usize;
        let mask = 1_u16 << (led % 16);
        if on {
            self.buffer[row] |= mask;
        } else {
            self.buffer[row] &= !mask;
        }
        Ok(())
    }

    pub fn led(&self, led: u8) -> bool {
        led < LED_COUNT && self.buffer[(led / 16) as usize] & (1 << (led % 16)) != 0
    }

    /// Replace a whole row of the buffer
    pub fn set_row(&mut self, row: u8, bits: u16) -> Result<(), DeviceError<T::Error>> {
        check_range::<T::Error, _>("row", row, 0, ROW_COUNT - 1)?;
        self.buffer[row as usize] = bits;
        Ok(())
    }

    /// Set a pixel of an 8x8 matrix backpack
    pub fn set_pixel(&mut self, x: u8, y: u8, on: bool) -> Result<(), DeviceError<T::Error>> {
        check_range::<T::Error, _>("x", x, 0, 7)?;
        check_range::<T::Error, _>("y", y, 0, ROW_COUNT - 1)?;
        self.set_led(y * 16 + x, on)
    }

    pub fn clear(&mut self) {
        self.buffer = [0; ROW_COUNT as usize];
    }

    /// Send the buffer to display RAM (low byte of each row first)
    pub fn write_display(&mut self) -> Result<(), DeviceError<T::Error>> {
        let mut ram = [0_u8; 2 * ROW_COUNT as usize];
        for (chunk, row) in ram.chunks_mut(2).zip(self.buffer.iter()) {
            chunk[0] = (row & 0xFF) as u8;
            chunk[1] = (row >> 8) as u8;
        }
        self.i2cdev
            .smbus_write_i2c_block_data(REGISTER_DISPLAY_RAM, &ram)?;
        Ok(())
    }

    pub fn release(self) -> T {
        self.i2cdev
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockI2CDevice;

    #[test]
    fn test_init_sequence() {
        let dev = Ht16k33::new(MockI2CDevice::new()).unwrap().release();
        assert_eq!(dev.writes, vec![vec![0x21], vec![0x81], vec![0xEF]]);
    }

    #[test]
    fn test_brightness_range() {
        let mut display = Ht16k33::new(MockI2CDevice::new()).unwrap();
        display.set_brightness(0).unwrap();
        match display.set_brightness(16) {
            Err(DeviceError::OutOfRange { name, max, .. }) => {
                assert_eq!(name, "brightness");
                assert_eq!(max, 15);
            }
            _ => panic!("brightness 16 accepted"),
        }
    }

    #[test]
    fn test_blink_rate() {
        let mut display = Ht16k33::new(MockI2CDevice::new()).unwrap();
        display.set_blink_rate(BlinkRate::HalfHz).unwrap();
        assert_eq!(display.release().last_write(), Some(&[0x87][..]));
    }

    #[test]
    fn test_leds_and_write_display() {
        let mut display = Ht16k33::new(MockI2CDevice::new()).unwrap();
        display.set_led(0, true).unwrap();
        display.set_led(17, true).unwrap();
        display.set_pixel(7, 7, true).unwrap();
        display.set_row(3, 0xBEEF).unwrap();
        assert!(display.led(17));
        assert!(!display.led(18));
        assert!(display.set_led(128, true).is_err());
        assert!(display.set_row(8, 0).is_err());
        display.write_display().unwrap();

        let dev = display.release();
        assert_eq!(
            dev.regmap.read_regs(0, 16),
            vec![0x01, 0, 0x02, 0, 0, 0, 0xEF, 0xBE, 0, 0, 0, 0, 0, 0, 0x80, 0]
        );
    }

    #[test]
    fn test_clear() {
        let mut display = Ht16k33::new(MockI2CDevice::new()).unwrap();
        display.set_led(5, true).unwrap();
        display.clear();
        assert!(!display.led(5));
    }
}
