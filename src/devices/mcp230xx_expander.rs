// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! Microchip MCP23008 / MCP23017 I2C I/O expanders
//!
//! The MCP23017 is two MCP23008 ports side by side; with IOCON.BANK left
//! at its reset value of 0 the A and B registers of each kind are adjacent,
//! so port B is always at the port A address plus one.  Direction, pull-up
//! and output latch registers are cached so single pin updates need only
//! one write.

use crate::core::{Direction, I2CDevice, Level};
use crate::devices::DigitalPort;
use crate::error::{check_range, DeviceError};
use log::debug;

pub const MCP230XX_I2C_ADDR: u16 = 0x20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Mcp23008,
    Mcp23017,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Register {
    IoDir,
    GpPu,
    Gpio,
    OLat,
}

impl Variant {
    pub fn pin_count(self) -> u8 {
        match self {
            Variant::Mcp23008 => 8,
            Variant::Mcp23017 => 16,
        }
    }

    fn address(self, register: Register) -> u8 {
        match (self, register) {
            (Variant::Mcp23008, Register::IoDir) => 0x00,
            (Variant::Mcp23008, Register::GpPu) => 0x06,
            (Variant::Mcp23008, Register::Gpio) => 0x09,
            (Variant::Mcp23008, Register::OLat) => 0x0A,
            (Variant::Mcp23017, Register::IoDir) => 0x00,
            (Variant::Mcp23017, Register::GpPu) => 0x0C,
            (Variant::Mcp23017, Register::Gpio) => 0x12,
            (Variant::Mcp23017, Register::OLat) => 0x14,
        }
    }

    fn port_bytes(self) -> u8 {
        self.pin_count() / 8
    }
}

pub struct Mcp230xx<T: I2CDevice + Sized> {
    i2cdev: T,
    variant: Variant,
    iodir: u16,
    gppu: u16,
    olat: u16,
}

impl<T> Mcp230xx<T>
where
    T: I2CDevice + Sized,
{
    /// Bring the chip to the power-on state: all inputs, no pull-ups,
    /// output latches low
    pub fn new(i2cdev: T, variant: Variant) -> Result<Mcp230xx<T>, DeviceError<T::Error>> {
        let mut expander = Mcp230xx {
            i2cdev,
            variant,
            iodir: 0xFFFF,
            gppu: 0,
            olat: 0,
        };
        expander.write_register(Register::IoDir, expander.iodir)?;
        expander.write_register(Register::GpPu, expander.gppu)?;
        expander.write_register(Register::OLat, expander.olat)?;
        debug!("{:?} initialised", variant);
        Ok(expander)
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    fn write_register(&mut self, register: Register, value: u16) -> Result<(), DeviceError<T::Error>> {
        let address = self.variant.address(register);
        match self.variant {
            Variant::Mcp23008 => self.i2cdev.smbus_write_byte_data(address, value as u8)?,
            // A then B thanks to the sequential address pointer
            Variant::Mcp23017 => self.i2cdev.smbus_write_word_data(address, value)?,
        }
        Ok(())
    }

    fn read_register(&mut self, register: Register) -> Result<u16, DeviceError<T::Error>> {
        let address = self.variant.address(register);
        Ok(match self.variant {
            Variant::Mcp23008 => u16::from(self.i2cdev.smbus_read_byte_data(address)?),
            Variant::Mcp23017 => self.i2cdev.smbus_read_word_data(address)?,
        })
    }

    fn check_pin(&self, pin: u8) -> Result<(), DeviceError<T::Error>> {
        check_range::<T::Error, _>("pin", pin, 0, self.variant.pin_count() - 1)
    }

    fn port_mask(&self) -> u16 {
        match self.variant.port_bytes() {
            1 => 0x00FF,
            _ => 0xFFFF,
        }
    }

    pub fn set_direction(&mut self, pin: u8, direction: Direction) -> Result<(), DeviceError<T::Error>> {
        self.check_pin(pin)?;
        let mask = 1 << pin;
        let iodir = match direction {
            Direction::Input => self.iodir | mask,
            Direction::Output => self.iodir & !mask,
        };
        self.write_register(Register::IoDir, iodir)?;
        self.iodir = iodir;
        Ok(())
    }

    pub fn direction(&self, pin: u8) -> Direction {
        if pin < self.variant.pin_count() && self.iodir & (1 << pin) == 0 {
            Direction::Output
        } else {
            Direction::Input
        }
    }

    /// Enable the internal 100k pull-up on an input pin
    pub fn set_pull_up(&mut self, pin: u8, enable: bool) -> Result<(), DeviceError<T::Error>> {
        self.check_pin(pin)?;
        let mask = 1 << pin;
        let gppu = if enable {
            self.gppu | mask
        } else {
            self.gppu & !mask
        };
        self.write_register(Register::GpPu, gppu)?;
        self.gppu = gppu;
        Ok(())
    }

    pub fn write_pin(&mut self, pin: u8, level: Level) -> Result<(), DeviceError<T::Error>> {
        self.check_pin(pin)?;
        let mask = 1 << pin;
        let olat = match level {
            Level::High => self.olat | mask,
            Level::Low => self.olat & !mask,
        };
        self.write_register(Register::OLat, olat)?;
        self.olat = olat;
        Ok(())
    }

    pub fn read_pin(&mut self, pin: u8) -> Result<Level, DeviceError<T::Error>> {
        self.check_pin(pin)?;
        let port = self.read_port()?;
        Ok(Level::from(port & (1 << pin) != 0))
    }

    /// Levels of all pins, pin 0 in bit 0
    pub fn read_port(&mut self) -> Result<u16, DeviceError<T::Error>> {
        self.read_register(Register::Gpio)
    }

    /// Set the output latches of all pins at once
    pub fn write_port(&mut self, value: u16) -> Result<(), DeviceError<T::Error>> {
        let value = value & self.port_mask();
        self.write_register(Register::OLat, value)?;
        self.olat = value;
        Ok(())
    }

    pub fn release(self) -> T {
        self.i2cdev
    }
}

impl<T> DigitalPort for Mcp230xx<T>
where
    T: I2CDevice + Sized,
    T::Error: 'static,
{
    type Error = DeviceError<T::Error>;

    fn pin_count(&self) -> u8 {
        self.variant.pin_count()
    }

    fn set_pin_direction(&mut self, pin: u8, direction: Direction) -> Result<(), Self::Error> {
        self.set_direction(pin, direction)
    }

    fn pin_direction(&self, pin: u8) -> Direction {
        self.direction(pin)
    }

    fn read_pin(&mut self, pin: u8) -> Result<Level, Self::Error> {
        Mcp230xx::read_pin(self, pin)
    }

    fn write_pin(&mut self, pin: u8, level: Level) -> Result<(), Self::Error> {
        Mcp230xx::write_pin(self, pin, level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockI2CDevice;

    #[test]
    fn test_mcp23008_init() {
        let dev = Mcp230xx::new(MockI2CDevice::new(), Variant::Mcp23008)
            .unwrap()
            .release();
        assert_eq!(
            dev.writes,
            vec![vec![0x00, 0xFF], vec![0x06, 0x00], vec![0x0A, 0x00]]
        );
    }

    #[test]
    fn test_mcp23008_pins() {
        let mut expander = Mcp230xx::new(MockI2CDevice::new(), Variant::Mcp23008).unwrap();
        expander.set_direction(3, Direction::Output).unwrap();
        expander.write_pin(3, Level::High).unwrap();
        expander.set_pull_up(5, true).unwrap();
        assert_eq!(expander.direction(3), Direction::Output);
        assert_eq!(expander.direction(4), Direction::Input);
        assert!(matches!(
            expander.write_pin(8, Level::High),
            Err(DeviceError::OutOfRange { .. })
        ));
        let dev = expander.release();
        assert_eq!(dev.regmap.reg(0x00), 0xF7);
        assert_eq!(dev.regmap.reg(0x0A), 0x08);
        assert_eq!(dev.regmap.reg(0x06), 0x20);
    }

    #[test]
    fn test_mcp23008_read() {
        let mut dev = MockI2CDevice::new();
        dev.regmap.write_regs(0x09, &[0b1000_0010]);
        let mut expander = Mcp230xx::new(dev, Variant::Mcp23008).unwrap();
        assert_eq!(expander.read_pin(1).unwrap(), Level::High);
        assert_eq!(expander.read_pin(2).unwrap(), Level::Low);
        assert_eq!(expander.read_port().unwrap(), 0x82);
    }

    #[test]
    fn test_mcp23017_port_b() {
        let mut dev = MockI2CDevice::new();
        dev.regmap.write_regs(0x12, &[0x00, 0x01]);
        let mut expander = Mcp230xx::new(dev, Variant::Mcp23017).unwrap();
        expander.set_direction(9, Direction::Output).unwrap();
        expander.write_pin(9, Level::High).unwrap();
        assert_eq!(expander.read_pin(8).unwrap(), Level::High);
        assert!(expander.set_direction(16, Direction::Output).is_err());
        let dev = expander.release();
        // IODIRB, OLATB
        assert_eq!(dev.regmap.read_regs(0x00, 2), vec![0xFF, 0xFD]);
        assert_eq!(dev.regmap.read_regs(0x14, 2), vec![0x00, 0x02]);
    }

    #[test]
    fn test_write_port() {
        let mut expander = Mcp230xx::new(MockI2CDevice::new(), Variant::Mcp23008).unwrap();
        expander.write_port(0x1A5).unwrap();
        assert_eq!(expander.release().last_write(), Some(&[0x0A, 0xA5][..]));
    }
}
