// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! Single pins carved out of multi-channel chips
//!
//! Each adapter holds a shared handle to its device plus a channel number,
//! so several adapters can be handed out for the same chip.  The handles
//! are `Rc<RefCell<_>>`; adapters stay on the thread that created them.

use crate::core::{Direction, GpioPin, I2CDevice, Level};
use crate::devices::pca9685_pwm::{self, Pca9685};
use crate::devices::{AnalogInput, AnalogOutput, DigitalPort};
use crate::error::DeviceError;
use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

/// Wrap a device so it can be shared between pin adapters
pub fn shared<D>(device: D) -> Rc<RefCell<D>> {
    Rc::new(RefCell::new(device))
}

fn full_scale(resolution_bits: u8) -> u16 {
    ((1_u32 << resolution_bits) - 1) as u16
}

/// One input channel of an analog-to-digital converter
pub struct AnalogInputPin<D: AnalogInput> {
    device: Rc<RefCell<D>>,
    channel: u8,
}

impl<D: AnalogInput> AnalogInputPin<D> {
    pub fn new(device: Rc<RefCell<D>>, channel: u8) -> AnalogInputPin<D> {
        AnalogInputPin { device, channel }
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Raw conversion result
    pub fn read(&self) -> Result<u16, D::Error> {
        self.device.borrow_mut().read_channel(self.channel)
    }

    /// Conversion result scaled to 0.0..=1.0
    pub fn read_normalized(&self) -> Result<f32, D::Error> {
        let mut device = self.device.borrow_mut();
        let max = full_scale(device.resolution_bits());
        let raw = device.read_channel(self.channel)?;
        Ok(f32::from(raw) / f32::from(max))
    }
}

/// One output channel of a digital-to-analog converter
pub struct AnalogOutputPin<D: AnalogOutput> {
    device: Rc<RefCell<D>>,
    channel: u8,
}

impl<D: AnalogOutput> AnalogOutputPin<D> {
    pub fn new(device: Rc<RefCell<D>>, channel: u8) -> AnalogOutputPin<D> {
        AnalogOutputPin { device, channel }
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn write(&self, value: u16) -> Result<(), D::Error> {
        self.device.borrow_mut().write_channel(self.channel, value)
    }

    /// Output a fraction of full scale; values outside 0.0..=1.0 are clamped
    pub fn write_normalized(&self, value: f32) -> Result<(), D::Error> {
        let mut device = self.device.borrow_mut();
        let max = full_scale(device.resolution_bits());
        let clamped = if value.is_nan() { 0.0 } else { value.max(0.0).min(1.0) };
        let raw = (clamped * f32::from(max)).round() as u16;
        device.write_channel(self.channel, raw)
    }
}

/// One pin of a [`DigitalPort`], usable wherever a [`GpioPin`] is expected
pub struct PortPin<D: DigitalPort> {
    device: Rc<RefCell<D>>,
    pin: u8,
}

impl<D: DigitalPort> PortPin<D> {
    pub fn new(device: Rc<RefCell<D>>, pin: u8) -> PortPin<D> {
        PortPin { device, pin }
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }
}

impl<D: DigitalPort> GpioPin for PortPin<D> {
    type Error = D::Error;

    fn set_direction(&mut self, direction: Direction) -> Result<(), D::Error> {
        self.device.borrow_mut().set_pin_direction(self.pin, direction)
    }

    fn direction(&self) -> Direction {
        self.device.borrow().pin_direction(self.pin)
    }

    fn read(&mut self) -> Result<Level, D::Error> {
        self.device.borrow_mut().read_pin(self.pin)
    }

    fn write(&mut self, level: Level) -> Result<(), D::Error> {
        self.device.borrow_mut().write_pin(self.pin, level)
    }
}

impl<D, E> embedded_hal::digital::ErrorType for PortPin<D>
where
    D: DigitalPort<Error = DeviceError<E>>,
    E: Debug,
{
    type Error = DeviceError<E>;
}

impl<D, E> embedded_hal::digital::OutputPin for PortPin<D>
where
    D: DigitalPort<Error = DeviceError<E>>,
    E: Debug,
{
    fn set_low(&mut self) -> Result<(), DeviceError<E>> {
        GpioPin::write(self, Level::Low)
    }

    fn set_high(&mut self) -> Result<(), DeviceError<E>> {
        GpioPin::write(self, Level::High)
    }
}

impl<D, E> embedded_hal::digital::InputPin for PortPin<D>
where
    D: DigitalPort<Error = DeviceError<E>>,
    E: Debug,
{
    fn is_high(&mut self) -> Result<bool, DeviceError<E>> {
        GpioPin::is_high(self)
    }

    fn is_low(&mut self) -> Result<bool, DeviceError<E>> {
        GpioPin::is_low(self)
    }
}

/// One channel of a PCA9685
pub struct PwmPin<T: I2CDevice> {
    device: Rc<RefCell<Pca9685<T>>>,
    channel: u8,
}

impl<T: I2CDevice> PwmPin<T> {
    pub fn new(device: Rc<RefCell<Pca9685<T>>>, channel: u8) -> PwmPin<T> {
        PwmPin { device, channel }
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Duty cycle out of 4095
    pub fn duty(&self) -> Result<u16, DeviceError<T::Error>> {
        self.device.borrow_mut().duty(self.channel)
    }

    pub fn set_duty(&self, duty: u16) -> Result<(), DeviceError<T::Error>> {
        self.device.borrow_mut().set_duty(self.channel, duty)
    }
}

impl<T: I2CDevice> embedded_hal::pwm::ErrorType for PwmPin<T> {
    type Error = DeviceError<T::Error>;
}

impl<T: I2CDevice> embedded_hal::pwm::SetDutyCycle for PwmPin<T> {
    fn max_duty_cycle(&self) -> u16 {
        pca9685_pwm::MAX_DUTY
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), DeviceError<T::Error>> {
        self.set_duty(duty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::mcp230xx_expander::{Mcp230xx, Variant};
    use crate::devices::mcp4725_dac::Mcp4725;
    use crate::devices::pcf8591_adc::Pcf8591;
    use crate::mock::MockI2CDevice;
    use embedded_hal::pwm::SetDutyCycle;

    #[test]
    fn test_analog_input_pin() {
        let mut dev = MockI2CDevice::new();
        dev.regmap.write_regs(0x01, &[0x00, 0xFF]);
        dev.regmap.write_regs(0x03, &[0x00, 0x33]);
        let adc = shared(Pcf8591::new(dev));
        let ch1 = AnalogInputPin::new(Rc::clone(&adc), 1);
        let ch3 = AnalogInputPin::new(Rc::clone(&adc), 3);
        assert_eq!(ch1.read_normalized().unwrap(), 1.0);
        assert_eq!(ch3.read().unwrap(), 0x33);
        assert_eq!(ch3.read_normalized().unwrap(), 0.2);
    }

    #[test]
    fn test_analog_output_pin() {
        let dac = shared(Mcp4725::new(MockI2CDevice::new()));
        let out = AnalogOutputPin::new(Rc::clone(&dac), 0);
        out.write_normalized(0.5).unwrap();
        out.write_normalized(7.0).unwrap();
        out.write_normalized(-1.0).unwrap();
        assert!(AnalogOutputPin::new(Rc::clone(&dac), 1).write(0).is_err());
        drop(out);

        let dev = Rc::try_unwrap(dac).ok().unwrap().into_inner().release();
        assert_eq!(
            dev.writes,
            vec![vec![0x08, 0x00], vec![0x0F, 0xFF], vec![0x00, 0x00]]
        );
    }

    #[test]
    fn test_port_pin() {
        let mut dev = MockI2CDevice::new();
        dev.regmap.write_regs(0x09, &[0x10]);
        let expander = shared(Mcp230xx::new(dev, Variant::Mcp23008).unwrap());
        let mut led = PortPin::new(Rc::clone(&expander), 2);
        let mut button = PortPin::new(Rc::clone(&expander), 4);

        led.set_direction(Direction::Output).unwrap();
        embedded_hal::digital::OutputPin::set_high(&mut led).unwrap();
        assert_eq!(GpioPin::direction(&led), Direction::Output);
        assert!(embedded_hal::digital::InputPin::is_high(&mut button).unwrap());
        assert_eq!(expander.borrow().direction(4), Direction::Input);

        let bad = PortPin::new(expander, 8);
        assert!(GpioPin::direction(&bad) == Direction::Input);
    }

    #[test]
    fn test_pwm_pin() {
        let pwm = shared(Pca9685::new(MockI2CDevice::new()).unwrap());
        let mut servo = PwmPin::new(Rc::clone(&pwm), 2);
        assert_eq!(servo.max_duty_cycle(), 4095);
        servo.set_duty_cycle(2048).unwrap();
        assert_eq!(servo.duty().unwrap(), 2048);
        servo.set_duty_cycle_percent(100).unwrap();
        assert_eq!(servo.duty().unwrap(), 4095);
        servo.set_duty_cycle_fully_off().unwrap();
        assert_eq!(servo.duty().unwrap(), 0);
    }
}
