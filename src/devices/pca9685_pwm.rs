// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! NXP PCA9685 16-channel, 12-bit PWM controller
//!
//! Each channel has a 12-bit counter; the output turns on when the counter
//! reaches `on` and off when it reaches `off`.  Setting bit 12 (4096) of
//! either value forces the output fully on or fully off.

#![allow(dead_code)] // register map

use crate::core::I2CDevice;
use crate::error::{check_range, DeviceError};
use crate::timing;
use bitflags::bitflags;
use log::debug;

pub const PCA9685_I2C_ADDR: u16 = 0x40;

const REGISTER_MODE1: u8 = 0x00;
const REGISTER_MODE2: u8 = 0x01;
const REGISTER_LED0_ON_L: u8 = 0x06;
const REGISTER_ALL_LED_ON_L: u8 = 0xFA;
const REGISTER_PRESCALE: u8 = 0xFE;

pub const GENERAL_CALL_ADDR: u16 = 0x00;
const SOFTWARE_RESET: u8 = 0x06;

pub const CHANNEL_COUNT: u8 = 16;
pub const MAX_DUTY: u16 = 4095;
const FULL: u16 = 4096;

const OSCILLATOR_HZ: f32 = 25_000_000.0;
const PRESCALE_MIN: u8 = 3;
const PRESCALE_MAX: u8 = 255;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Mode1: u8 {
        const RESTART = 0x80;
        const EXTCLK = 0x40;
        const AUTO_INCREMENT = 0x20;
        const SLEEP = 0x10;
        const SUB1 = 0x08;
        const SUB2 = 0x04;
        const SUB3 = 0x02;
        const ALLCALL = 0x01;
    }
}

const MODE2_OUTDRV: u8 = 0x04;

/// Prescale value for an output frequency, clamped to what the chip accepts
pub fn prescale_for_frequency(hz: f32) -> u8 {
    let prescale = (OSCILLATOR_HZ / 4096.0 / hz).round() - 1.0;
    if prescale < f32::from(PRESCALE_MIN) {
        PRESCALE_MIN
    } else if prescale > f32::from(PRESCALE_MAX) {
        PRESCALE_MAX
    } else {
        prescale as u8
    }
}

/// Output frequency produced by a prescale value
pub fn frequency_for_prescale(prescale: u8) -> f32 {
    OSCILLATOR_HZ / 4096.0 / (f32::from(prescale) + 1.0)
}

/// Counter values `(on, off)` producing `duty` out of 4095
fn duty_to_counts(duty: u16) -> (u16, u16) {
    match duty {
        0 => (0, FULL),
        d if d >= MAX_DUTY => (FULL, 0),
        d => (0, d),
    }
}

/// Reset every PCA9685 on the bus through the I2C general call address
///
/// `general_call` must be a handle to address 0x00 on the same bus.
pub fn software_reset<G: I2CDevice>(general_call: &mut G) -> Result<(), DeviceError<G::Error>> {
    debug!("PCA9685 software reset via general call");
    general_call.smbus_write_byte(SOFTWARE_RESET)?;
    Ok(())
}

pub struct Pca9685<T: I2CDevice + Sized> {
    i2cdev: T,
}

impl<T> Pca9685<T>
where
    T: I2CDevice + Sized,
{
    /// Reset all channels and wake the oscillator
    pub fn new(i2cdev: T) -> Result<Pca9685<T>, DeviceError<T::Error>> {
        let mut pca = Pca9685 { i2cdev };
        // MODE1.AI is clear after power up, so no block writes yet
        pca.set_all_pwm(0, 0)?;
        pca.i2cdev.smbus_write_byte_data(REGISTER_MODE2, MODE2_OUTDRV)?;
        pca.i2cdev
            .smbus_write_byte_data(REGISTER_MODE1, Mode1::ALLCALL.bits())?;
        // oscillator needs 500us to start
        timing::delay_ms(5);

        let mode1 = Mode1::from_bits_truncate(pca.i2cdev.smbus_read_byte_data(REGISTER_MODE1)?);
        pca.i2cdev
            .smbus_write_byte_data(REGISTER_MODE1, (mode1 - Mode1::SLEEP).bits())?;
        timing::delay_ms(5);
        debug!("PCA9685 initialised");

        Ok(pca)
    }

    /// Set the PWM frequency shared by all channels
    pub fn set_pwm_frequency(&mut self, hz: f32) -> Result<(), DeviceError<T::Error>> {
        if !hz.is_finite() || hz <= 0.0 {
            return Err(DeviceError::InvalidConfig("PWM frequency must be positive"));
        }
        let prescale = prescale_for_frequency(hz);
        debug!("PCA9685 frequency {} Hz, prescale {}", hz, prescale);

        // the prescaler can only be written while the oscillator sleeps
        let old_mode = Mode1::from_bits_truncate(self.i2cdev.smbus_read_byte_data(REGISTER_MODE1)?);
        let sleep_mode = (old_mode - Mode1::RESTART) | Mode1::SLEEP;
        self.i2cdev.smbus_write_byte_data(REGISTER_MODE1, sleep_mode.bits())?;
        self.i2cdev.smbus_write_byte_data(REGISTER_PRESCALE, prescale)?;
        self.i2cdev.smbus_write_byte_data(REGISTER_MODE1, old_mode.bits())?;
        timing::delay_ms(5);
        self.i2cdev
            .smbus_write_byte_data(REGISTER_MODE1, (old_mode | Mode1::RESTART).bits())?;
        Ok(())
    }

    /// Currently configured PWM frequency
    pub fn pwm_frequency(&mut self) -> Result<f32, DeviceError<T::Error>> {
        let prescale = self.i2cdev.smbus_read_byte_data(REGISTER_PRESCALE)?;
        Ok(frequency_for_prescale(prescale))
    }

    /// Set the raw on/off counter values of one channel
    pub fn set_pwm(&mut self, channel: u8, on: u16, off: u16) -> Result<(), DeviceError<T::Error>> {
        check_range::<T::Error, _>("channel", channel, 0, CHANNEL_COUNT - 1)?;
        check_range::<T::Error, _>("on count", on, 0, FULL)?;
        check_range::<T::Error, _>("off count", off, 0, FULL)?;
        let register = REGISTER_LED0_ON_L + 4 * channel;
        self.i2cdev.smbus_write_byte_data(register, (on & 0xFF) as u8)?;
        self.i2cdev.smbus_write_byte_data(register + 1, (on >> 8) as u8)?;
        self.i2cdev.smbus_write_byte_data(register + 2, (off & 0xFF) as u8)?;
        self.i2cdev.smbus_write_byte_data(register + 3, (off >> 8) as u8)?;
        Ok(())
    }

    /// Set the same on/off counter values on every channel
    pub fn set_all_pwm(&mut self, on: u16, off: u16) -> Result<(), DeviceError<T::Error>> {
        check_range::<T::Error, _>("on count", on, 0, FULL)?;
        check_range::<T::Error, _>("off count", off, 0, FULL)?;
        self.i2cdev.smbus_write_byte_data(REGISTER_ALL_LED_ON_L, (on & 0xFF) as u8)?;
        self.i2cdev.smbus_write_byte_data(REGISTER_ALL_LED_ON_L + 1, (on >> 8) as u8)?;
        self.i2cdev.smbus_write_byte_data(REGISTER_ALL_LED_ON_L + 2, (off & 0xFF) as u8)?;
        self.i2cdev.smbus_write_byte_data(REGISTER_ALL_LED_ON_L + 3, (off >> 8) as u8)?;
        Ok(())
    }

    /// Set a channel's duty cycle out of 4095; 0 and 4095 are fully off/on
    pub fn set_duty(&mut self, channel: u8, duty: u16) -> Result<(), DeviceError<T::Error>> {
        let (on, off) = duty_to_counts(duty);
        self.set_pwm(channel, on, off)
    }

    /// Read back a channel's `(on, off)` counters
    pub fn pwm(&mut self, channel: u8) -> Result<(u16, u16), DeviceError<T::Error>> {
        check_range::<T::Error, _>("channel", channel, 0, CHANNEL_COUNT - 1)?;
        let register = REGISTER_LED0_ON_L + 4 * channel;
        let mut regs = [0_u8; 4];
        for (i, reg) in regs.iter_mut().enumerate() {
            *reg = self.i2cdev.smbus_read_byte_data(register + i as u8)?;
        }
        let on = u16::from(regs[0]) | (u16::from(regs[1] & 0x1F) << 8);
        let off = u16::from(regs[2]) | (u16::from(regs[3] & 0x1F) << 8);
        Ok((on, off))
    }

    /// Duty cycle of a channel out of 4095
    pub fn duty(&mut self, channel: u8) -> Result<u16, DeviceError<T::Error>> {
        let (on, off) = self.pwm(channel)?;
        Ok(if on & FULL != 0 {
            MAX_DUTY
        } else if off & FULL != 0 {
            0
        } else {
            off.wrapping_sub(on) & 0x0FFF
        })
    }

    /// Consume the driver, returning the underlying device
    pub fn release(self) -> T {
        self.i2cdev
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockI2CDevice;

    #[test]
    fn test_prescale_for_frequency() {
        assert_eq!(prescale_for_frequency(50.0), 121);
        assert_eq!(prescale_for_frequency(1526.0), 3);
        // clamped at both ends
        assert_eq!(prescale_for_frequency(1.0), 255);
        assert_eq!(prescale_for_frequency(5000.0), 3);
    }

    #[test]
    fn test_duty_to_counts() {
        assert_eq!(duty_to_counts(0), (0, 4096));
        assert_eq!(duty_to_counts(2048), (0, 2048));
        assert_eq!(duty_to_counts(4095), (4096, 0));
        assert_eq!(duty_to_counts(u16::MAX), (4096, 0));
    }

    #[test]
    fn test_init_wakes_chip() {
        let pca = Pca9685::new(MockI2CDevice::new()).unwrap();
        let dev = pca.release();
        assert_eq!(dev.regmap.reg(REGISTER_MODE2), MODE2_OUTDRV);
        assert_eq!(dev.regmap.reg(REGISTER_MODE1) & Mode1::SLEEP.bits(), 0);
    }

    #[test]
    fn test_init_write_sequence() {
        let dev = Pca9685::new(MockI2CDevice::new()).unwrap().release();
        let expected: Vec<Vec<u8>> = vec![
            vec![0xFA, 0x00],
            vec![0xFB, 0x00],
            vec![0xFC, 0x00],
            vec![0xFD, 0x00],
            vec![REGISTER_MODE2, MODE2_OUTDRV],
            vec![REGISTER_MODE1, Mode1::ALLCALL.bits()],
            vec![REGISTER_MODE1],
            vec![REGISTER_MODE1, Mode1::ALLCALL.bits()],
        ];
        assert_eq!(dev.writes, expected);
        // single byte writes only, never a multi-byte run
        assert!(dev.writes.iter().all(|w| w.len() <= 2));
    }

    #[test]
    fn test_set_all_pwm() {
        let mut pca = Pca9685::new(MockI2CDevice::new()).unwrap();
        pca.i2cdev.writes.clear();
        pca.set_all_pwm(0x123, FULL).unwrap();
        assert_eq!(
            pca.i2cdev.writes,
            vec![
                vec![0xFA, 0x23],
                vec![0xFB, 0x01],
                vec![0xFC, 0x00],
                vec![0xFD, 0x10],
            ]
        );
        assert_eq!(
            pca.i2cdev.regmap.read_regs(REGISTER_ALL_LED_ON_L as usize, 4),
            vec![0x23, 0x01, 0x00, 0x10]
        );

        pca.i2cdev.writes.clear();
        assert!(matches!(
            pca.set_all_pwm(0, FULL + 1),
            Err(DeviceError::OutOfRange { name: "off count", .. })
        ));
        assert!(pca.i2cdev.writes.is_empty());
    }

    #[test]
    fn test_set_pwm_frequency() {
        let mut pca = Pca9685::new(MockI2CDevice::new()).unwrap();
        pca.set_pwm_frequency(50.0).unwrap();
        let dev = pca.release();
        assert_eq!(dev.regmap.reg(REGISTER_PRESCALE), 121);
        // the chip was put to sleep before the prescaler was written
        let prescale_write = dev
            .writes
            .iter()
            .position(|w| w[..] == [REGISTER_PRESCALE, 121])
            .unwrap();
        let sleep_write = &dev.writes[prescale_write - 1];
        assert_eq!(sleep_write[0], REGISTER_MODE1);
        assert_ne!(sleep_write[1] & Mode1::SLEEP.bits(), 0);
        assert_ne!(dev.regmap.reg(REGISTER_MODE1) & Mode1::RESTART.bits(), 0);
    }

    #[test]
    fn test_set_duty_and_read_back() {
        let mut pca = Pca9685::new(MockI2CDevice::new()).unwrap();
        pca.set_duty(3, 1000).unwrap();
        assert_eq!(pca.pwm(3).unwrap(), (0, 1000));
        assert_eq!(pca.duty(3).unwrap(), 1000);
        pca.set_duty(15, 0).unwrap();
        assert_eq!(pca.duty(15).unwrap(), 0);
        pca.set_duty(0, 4095).unwrap();
        assert_eq!(pca.duty(0).unwrap(), 4095);
    }

    #[test]
    fn test_channel_out_of_range() {
        let mut pca = Pca9685::new(MockI2CDevice::new()).unwrap();
        let writes_before = pca.i2cdev.writes.len();
        match pca.set_duty(16, 100) {
            Err(DeviceError::OutOfRange { name, value, .. }) => {
                assert_eq!(name, "channel");
                assert_eq!(value, 16);
            }
            _ => panic!("expected channel to be rejected"),
        }
        assert_eq!(pca.i2cdev.writes.len(), writes_before);
        assert!(pca.set_pwm(0, 4097, 0).is_err());
    }

    #[test]
    fn test_software_reset() {
        let mut general_call = MockI2CDevice::new();
        software_reset(&mut general_call).unwrap();
        assert_eq!(general_call.last_write(), Some(&[SOFTWARE_RESET][..]));
    }

    #[test]
    fn test_invalid_frequency() {
        let mut pca = Pca9685::new(MockI2CDevice::new()).unwrap();
        assert!(matches!(
            pca.set_pwm_frequency(0.0),
            Err(DeviceError::InvalidConfig(_))
        ));
    }
}
