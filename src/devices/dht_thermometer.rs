// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

// Aosong DHT11 / DHT22 (AM2302) temperature and humidity sensors.
//
// The host pulls the single data line low to request a reading, then
// releases it.  The sensor answers with an 80us low / 80us high preamble
// followed by 40 bits; every bit is a ~50us low followed by a high pulse of
// ~27us for a zero or ~70us for a one.  The last byte is a checksum over
// the first four.

use crate::core::{Direction, GpioPin, Level};
use crate::devices::{Hygrometer, Thermometer};
use crate::error::DeviceError;
use crate::timing;
use log::warn;
use std::time::Duration;

const EDGE_TIMEOUT: Duration = Duration::from_micros(200);
/// High pulses longer than this are ones
const ONE_THRESHOLD: Duration = Duration::from_micros(48);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhtKind {
    Dht11,
    Dht22,
}

impl DhtKind {
    /// How long the host holds the line low to request a reading
    fn start_pulse(self) -> Duration {
        match self {
            DhtKind::Dht11 => Duration::from_millis(18),
            DhtKind::Dht22 => Duration::from_millis(2),
        }
    }

    /// Minimum time between two readings
    pub fn sampling_period(self) -> Duration {
        match self {
            DhtKind::Dht11 => Duration::from_secs(1),
            DhtKind::Dht22 => Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DhtReading {
    pub temperature_celsius: f32,
    pub relative_humidity: f32,
}

/// Checksum carried in the fifth byte of a frame
pub fn dht_checksum(data: &[u8; 5]) -> u8 {
    data[..4].iter().fold(0_u8, |sum, b| sum.wrapping_add(*b))
}

impl DhtReading {
    /// Decode a 5 byte frame, rejecting it if the checksum does not match
    pub fn decode<E>(kind: DhtKind, data: &[u8; 5]) -> Result<DhtReading, DeviceError<E>> {
        let computed = dht_checksum(data);
        if computed != data[4] {
            return Err(DeviceError::Checksum {
                expected: data[4],
                computed,
            });
        }
        Ok(match kind {
            DhtKind::Dht11 => {
                let magnitude = f32::from(data[2]) + f32::from(data[3] & 0x7F) / 10.0;
                DhtReading {
                    relative_humidity: f32::from(data[0]) + f32::from(data[1]) / 10.0,
                    temperature_celsius: if data[3] & 0x80 != 0 {
                        -magnitude
                    } else {
                        magnitude
                    },
                }
            }
            DhtKind::Dht22 => {
                let humidity = (u16::from(data[0]) << 8) | u16::from(data[1]);
                let temperature = (u16::from(data[2] & 0x7F) << 8) | u16::from(data[3]);
                let magnitude = f32::from(temperature) / 10.0;
                DhtReading {
                    relative_humidity: f32::from(humidity) / 10.0,
                    temperature_celsius: if data[2] & 0x80 != 0 {
                        -magnitude
                    } else {
                        magnitude
                    },
                }
            }
        })
    }
}

pub struct Dht<P: GpioPin> {
    pin: P,
    kind: DhtKind,
}

impl<P: GpioPin> Dht<P> {
    pub fn new(mut pin: P, kind: DhtKind) -> Result<Dht<P>, DeviceError<P::Error>> {
        // idle state is the line released and pulled high
        pin.set_direction(Direction::Input)?;
        Ok(Dht { pin, kind })
    }

    fn wait_for(&mut self, level: Level, what: &'static str) -> Result<Duration, DeviceError<P::Error>> {
        match timing::wait_for_level(&mut self.pin, level, EDGE_TIMEOUT)? {
            Some(elapsed) => Ok(elapsed),
            None => {
                warn!("DHT timed out waiting for {}", what);
                Err(DeviceError::Timeout(what))
            }
        }
    }

    /// Run the start handshake and collect the raw 40 bit frame
    pub fn read_raw(&mut self) -> Result<[u8; 5], DeviceError<P::Error>> {
        self.pin.set_direction(Direction::Output)?;
        self.pin.write(Level::Low)?;
        timing::delay(self.kind.start_pulse());
        self.pin.write(Level::High)?;
        timing::delay_us(30);
        self.pin.set_direction(Direction::Input)?;

        self.wait_for(Level::Low, "sensor response")?;
        self.wait_for(Level::High, "response preamble")?;
        self.wait_for(Level::Low, "first data bit")?;

        let mut data = [0_u8; 5];
        for i in 0..40 {
            self.wait_for(Level::High, "data bit")?;
            let high = self.wait_for(Level::Low, "end of data bit")?;
            if high > ONE_THRESHOLD {
                data[i / 8] |= 0x80 >> (i % 8);
            }
        }
        Ok(data)
    }

    pub fn read(&mut self) -> Result<DhtReading, DeviceError<P::Error>> {
        let data = self.read_raw()?;
        DhtReading::decode(self.kind, &data).map_err(|e| {
            warn!("DHT frame {:02x?} rejected: {}", data, e);
            e
        })
    }
}

impl<P: GpioPin> Thermometer for Dht<P>
where
    P::Error: 'static,
{
    type Error = DeviceError<P::Error>;

    fn temperature_celsius(&mut self) -> Result<f32, Self::Error> {
        self.read().map(|r| r.temperature_celsius)
    }
}

impl<P: GpioPin> Hygrometer for Dht<P>
where
    P::Error: 'static,
{
    type Error = DeviceError<P::Error>;

    fn relative_humidity(&mut self) -> Result<f32, Self::Error> {
        self.read().map(|r| r.relative_humidity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPin;
    use std::io;

    macro_rules! assert_almost_eq {
        ($left:expr, $right:expr) => {{
            match (&($left), &($right)) {
                (left_val, right_val) => {
                    if (*left_val - *right_val).abs() > 0.0001 {
                        panic!("assertion failed: ({:?} != {:?})", *left_val, *right_val);
                    }
                }
            }
        }};
    }

    #[test]
    fn test_decode_dht22() {
        let reading = DhtReading::decode::<io::Error>(DhtKind::Dht22, &[0x02, 0x8C, 0x01, 0x5F, 0xEE]).unwrap();
        assert_almost_eq!(reading.relative_humidity, 65.2);
        assert_almost_eq!(reading.temperature_celsius, 35.1);
    }

    #[test]
    fn test_decode_dht22_negative() {
        // -10.1C
        let reading = DhtReading::decode::<io::Error>(DhtKind::Dht22, &[0x02, 0x8C, 0x80, 0x65, 0x73]).unwrap();
        assert_almost_eq!(reading.temperature_celsius, -10.1);
    }

    #[test]
    fn test_decode_dht11() {
        let reading = DhtReading::decode::<io::Error>(DhtKind::Dht11, &[45, 0, 23, 4, 72]).unwrap();
        assert_almost_eq!(reading.relative_humidity, 45.0);
        assert_almost_eq!(reading.temperature_celsius, 23.4);
    }

    #[test]
    fn test_checksum_mismatch() {
        match DhtReading::decode::<io::Error>(DhtKind::Dht22, &[0x02, 0x8C, 0x01, 0x5F, 0xEF]) {
            Err(DeviceError::Checksum { expected, computed }) => {
                assert_eq!(expected, 0xEF);
                assert_eq!(computed, 0xEE);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_checksum_wraps() {
        assert_eq!(dht_checksum(&[0xFF, 0xFF, 0x01, 0x01, 0]), 0x00);
    }

    #[test]
    fn test_no_response_times_out() {
        let pin = MockPin::new();
        pin.queue_input(vec![Level::High]);
        let mut dht = Dht::new(pin.clone(), DhtKind::Dht22).unwrap();
        assert!(matches!(dht.read(), Err(DeviceError::Timeout(_))));
        // start pulse: pulled low, then released high
        assert_eq!(pin.history(), vec![Level::Low, Level::High]);
        assert_eq!(pin.direction(), Direction::Input);
    }
}
