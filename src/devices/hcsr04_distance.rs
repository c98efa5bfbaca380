// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

// HC-SR04 ultrasonic range finder.  A 10us pulse on the trigger pin starts
// a ping; the echo pin is then held high for as long as the sound took to
// travel to the obstacle and back.

use crate::core::{Direction, GpioPin, Level};
use crate::devices::RangeFinder;
use crate::error::DeviceError;
use crate::timing;
use log::warn;
use std::time::Duration;

const TRIGGER_PULSE_US: u64 = 10;
const ECHO_START_TIMEOUT: Duration = Duration::from_millis(30);
/// The module gives up after about 38ms when nothing echoes back
const ECHO_END_TIMEOUT: Duration = Duration::from_millis(40);

const DEFAULT_TEMPERATURE: f32 = 20.0;

/// Speed of sound in air in m/s
pub fn speed_of_sound(temperature_celsius: f32) -> f32 {
    331.3 + 0.606 * temperature_celsius
}

/// Distance in cm for a round trip echo of `pulse`
pub fn pulse_to_cm(pulse: Duration, temperature_celsius: f32) -> f32 {
    // halved for the round trip, m to cm
    pulse.as_secs_f32() * speed_of_sound(temperature_celsius) * 50.0
}

pub struct HcSr04<P: GpioPin> {
    trigger: P,
    echo: P,
    temperature: f32,
}

impl<P: GpioPin> HcSr04<P> {
    pub fn new(mut trigger: P, mut echo: P) -> Result<HcSr04<P>, DeviceError<P::Error>> {
        trigger.set_direction(Direction::Output)?;
        trigger.write(Level::Low)?;
        echo.set_direction(Direction::Input)?;
        Ok(HcSr04 {
            trigger,
            echo,
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    /// Air temperature used to correct the speed of sound
    pub fn with_temperature(mut self, temperature_celsius: f32) -> HcSr04<P> {
        self.temperature = temperature_celsius;
        self
    }

    pub fn set_temperature(&mut self, temperature_celsius: f32) {
        self.temperature = temperature_celsius;
    }

    /// Send a ping and time the echo
    pub fn measure_pulse(&mut self) -> Result<Duration, DeviceError<P::Error>> {
        self.trigger.write(Level::High)?;
        timing::delay_us(TRIGGER_PULSE_US);
        self.trigger.write(Level::Low)?;

        if timing::wait_for_level(&mut self.echo, Level::High, ECHO_START_TIMEOUT)?.is_none() {
            warn!("HC-SR04 echo never started");
            return Err(DeviceError::Timeout("echo to start"));
        }
        match timing::wait_for_level(&mut self.echo, Level::Low, ECHO_END_TIMEOUT)? {
            Some(width) => Ok(width),
            None => {
                warn!("HC-SR04 echo never ended");
                Err(DeviceError::Timeout("echo to end"))
            }
        }
    }

    pub fn measure_cm(&mut self) -> Result<f32, DeviceError<P::Error>> {
        let pulse = self.measure_pulse()?;
        Ok(pulse_to_cm(pulse, self.temperature))
    }

    pub fn release(self) -> (P, P) {
        (self.trigger, self.echo)
    }
}

impl<P: GpioPin> RangeFinder for HcSr04<P>
where
    P::Error: 'static,
{
    type Error = DeviceError<P::Error>;

    fn distance_cm(&mut self) -> Result<f32, Self::Error> {
        self.measure_cm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPin;

    #[test]
    fn test_pulse_to_cm() {
        let cm = pulse_to_cm(Duration::from_micros(1000), 0.0);
        assert!((cm - 16.565).abs() < 0.001);
        // sound is faster in warm air
        assert!(pulse_to_cm(Duration::from_micros(1000), 30.0) > cm);
    }

    #[test]
    fn test_measure() {
        let trigger = MockPin::new();
        let echo = MockPin::new();
        let mut sensor = HcSr04::new(trigger.clone(), echo.clone()).unwrap();
        echo.queue_input(vec![Level::Low, Level::High, Level::High, Level::Low]);
        let cm = sensor.distance_cm().unwrap();
        assert!(cm >= 0.0 && cm < 100.0);
        assert_eq!(trigger.history(), vec![Level::Low, Level::High, Level::Low]);
        assert_eq!(echo.pending_input(), 0);
    }

    #[test]
    fn test_no_echo() {
        let echo = MockPin::new();
        let mut sensor = HcSr04::new(MockPin::new(), echo).unwrap();
        assert!(matches!(
            sensor.measure_pulse(),
            Err(DeviceError::Timeout("echo to start"))
        ));
    }
}
