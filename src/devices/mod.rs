// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

use crate::core::{Direction, Level};
use std::error::Error;

pub mod bh1750_light;
pub mod dht_thermometer;
pub mod ds1307_rtc;
pub mod hcsr04_distance;
pub mod hd44780_lcd;
pub mod ht16k33_led;
pub mod mcp230xx_expander;
pub mod mcp3008_adc;
pub mod mcp4725_dac;
pub mod mcp9808_thermometer;
pub mod pca9685_pwm;
pub mod pcf8591_adc;
pub mod sht1x_thermometer;

/// Trait for sensors that provide access to temperature readings
pub trait Thermometer {
    type Error: Error;

    /// Get a temperature from the sensor in degrees celsius
    fn temperature_celsius(&mut self) -> Result<f32, Self::Error>;
}

/// Trait for sensors that provide access to relative humidity readings
pub trait Hygrometer {
    type Error: Error;

    /// Relative humidity in percent
    fn relative_humidity(&mut self) -> Result<f32, Self::Error>;
}

/// Trait for sensors that measure the distance to an obstacle
pub trait RangeFinder {
    type Error: Error;

    fn distance_cm(&mut self) -> Result<f32, Self::Error>;
}

/// Trait for ambient light sensors
pub trait LightSensor {
    type Error: Error;

    fn lux(&mut self) -> Result<f32, Self::Error>;
}

/// A converter with one or more analog inputs
pub trait AnalogInput {
    type Error: Error;

    fn channel_count(&self) -> u8;

    /// Width of a raw sample; readings lie in `0..(1 << resolution_bits)`
    fn resolution_bits(&self) -> u8;

    fn read_channel(&mut self, channel: u8) -> Result<u16, Self::Error>;
}

/// A converter with one or more analog outputs
pub trait AnalogOutput {
    type Error: Error;

    fn channel_count(&self) -> u8;

    fn resolution_bits(&self) -> u8;

    fn write_channel(&mut self, channel: u8, value: u16) -> Result<(), Self::Error>;
}

/// A chip exposing a bank of individually addressable digital pins
pub trait DigitalPort {
    type Error: Error;

    fn pin_count(&self) -> u8;

    fn set_pin_direction(&mut self, pin: u8, direction: Direction) -> Result<(), Self::Error>;

    /// The direction last configured for `pin`
    fn pin_direction(&self, pin: u8) -> Direction;

    fn read_pin(&mut self, pin: u8) -> Result<Level, Self::Error>;

    fn write_pin(&mut self, pin: u8, level: Level) -> Result<(), Self::Error>;
}
