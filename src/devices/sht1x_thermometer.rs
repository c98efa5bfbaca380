// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! Sensirion SHT1x (SHT10/SHT11/SHT15) temperature and humidity sensor
//!
//! Conversions use the datasheet coefficients for a 5V supply at the
//! default 14-bit temperature and 12-bit humidity resolution.

use crate::bus::SensiBus;
use crate::core::GpioPin;
use crate::devices::{Hygrometer, Thermometer};
use crate::error::DeviceError;
use crate::timing;
use log::{debug, warn};
use std::time::Duration;

const CMD_MEASURE_TEMPERATURE: u8 = 0x03;
const CMD_MEASURE_HUMIDITY: u8 = 0x05;
const CMD_SOFT_RESET: u8 = 0x1E;

/// A 14-bit measurement takes up to 320ms
const MEASUREMENT_TIMEOUT: Duration = Duration::from_millis(320);

const D1: f32 = -40.1;
const D2: f32 = 0.01;

const C1: f32 = -2.0468;
const C2: f32 = 0.0367;
const C3: f32 = -1.5955e-6;
const T1: f32 = 0.01;
const T2: f32 = 0.000_08;

/// Temperature from a raw 14-bit reading
pub fn convert_temperature(raw: u16) -> f32 {
    D1 + D2 * f32::from(raw)
}

/// Relative humidity from a raw 12-bit reading, compensated for
/// `temperature` and limited to the physical range
pub fn convert_humidity(raw: u16, temperature: f32) -> f32 {
    let so = f32::from(raw);
    let linear = C1 + C2 * so + C3 * so * so;
    let compensated = (temperature - 25.0) * (T1 + T2 * so) + linear;
    compensated.max(0.0).min(100.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShtReading {
    pub temperature_celsius: f32,
    pub relative_humidity: f32,
}

pub struct Sht1x<P: GpioPin> {
    bus: SensiBus<P>,
}

impl<P: GpioPin> Sht1x<P> {
    pub fn new(data: P, clock: P) -> Result<Sht1x<P>, DeviceError<P::Error>> {
        let mut bus = SensiBus::new(data, clock)?;
        bus.reset_connection()?;
        Ok(Sht1x { bus })
    }

    /// Reset the interface and the status register to defaults
    pub fn soft_reset(&mut self) -> Result<(), DeviceError<P::Error>> {
        self.bus.reset_connection()?;
        self.bus.write_byte(CMD_SOFT_RESET)?;
        timing::delay_ms(11);
        debug!("SHT1x soft reset");
        Ok(())
    }

    fn measure(&mut self, command: u8) -> Result<u16, DeviceError<P::Error>> {
        self.bus.start()?;
        self.bus.write_byte(command)?;
        if let Err(e) = self.bus.wait_for_data_ready(MEASUREMENT_TIMEOUT) {
            warn!("SHT1x measurement 0x{:02x} did not complete", command);
            return Err(e);
        }
        let msb = self.bus.read_byte(true)?;
        let lsb = self.bus.read_byte(true)?;
        // the trailing CRC is clocked out and ignored
        self.bus.read_byte(false)?;
        Ok((u16::from(msb) << 8) | u16::from(lsb))
    }

    pub fn read_raw_temperature(&mut self) -> Result<u16, DeviceError<P::Error>> {
        self.measure(CMD_MEASURE_TEMPERATURE)
    }

    pub fn read_raw_humidity(&mut self) -> Result<u16, DeviceError<P::Error>> {
        self.measure(CMD_MEASURE_HUMIDITY)
    }

    pub fn read_temperature(&mut self) -> Result<f32, DeviceError<P::Error>> {
        Ok(convert_temperature(self.read_raw_temperature()?))
    }

    /// Measure temperature, then humidity compensated with it
    pub fn read(&mut self) -> Result<ShtReading, DeviceError<P::Error>> {
        let temperature = self.read_temperature()?;
        let humidity = convert_humidity(self.read_raw_humidity()?, temperature);
        Ok(ShtReading {
            temperature_celsius: temperature,
            relative_humidity: humidity,
        })
    }

    pub fn release(self) -> SensiBus<P> {
        self.bus
    }
}

impl<P: GpioPin> Thermometer for Sht1x<P>
where
    P::Error: 'static,
{
    type Error = DeviceError<P::Error>;

    fn temperature_celsius(&mut self) -> Result<f32, Self::Error> {
        self.read_temperature()
    }
}

impl<P: GpioPin> Hygrometer for Sht1x<P>
where
    P::Error: 'static,
{
    type Error = DeviceError<P::Error>;

    fn relative_humidity(&mut self) -> Result<f32, Self::Error> {
        self.read().map(|r| r.relative_humidity)
    }
}
