// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

// Two-wire protocol spoken by the Sensirion SHT1x family.  It looks like
// I2C but has its own start condition and no addressing.  The data line is
// open drain: a one is sent by releasing the line (switching to input) and
// letting the pull-up raise it.

use crate::core::{Direction, GpioPin, Level};
use crate::error::DeviceError;
use crate::timing;
use std::time::Duration;

const EDGE_DELAY_US: u64 = 2;

pub struct SensiBus<P: GpioPin> {
    data: P,
    clock: P,
}

impl<P: GpioPin> SensiBus<P> {
    pub fn new(mut data: P, mut clock: P) -> Result<SensiBus<P>, DeviceError<P::Error>> {
        clock.set_direction(Direction::Output)?;
        clock.write(Level::Low)?;
        data.set_direction(Direction::Input)?;
        Ok(SensiBus { data, clock })
    }

    fn release_data(&mut self) -> Result<(), DeviceError<P::Error>> {
        self.data.set_direction(Direction::Input)?;
        Ok(())
    }

    fn pull_data_low(&mut self) -> Result<(), DeviceError<P::Error>> {
        self.data.set_direction(Direction::Output)?;
        self.data.write(Level::Low)?;
        Ok(())
    }

    fn clock_high(&mut self) -> Result<(), DeviceError<P::Error>> {
        self.clock.write(Level::High)?;
        timing::delay_us(EDGE_DELAY_US);
        Ok(())
    }

    fn clock_low(&mut self) -> Result<(), DeviceError<P::Error>> {
        self.clock.write(Level::Low)?;
        timing::delay_us(EDGE_DELAY_US);
        Ok(())
    }

    /// Transmission start: data falls while clock is high, then rises again
    /// during the next high clock phase
    pub fn start(&mut self) -> Result<(), DeviceError<P::Error>> {
        self.release_data()?;
        self.clock_high()?;
        self.pull_data_low()?;
        self.clock_low()?;
        self.clock_high()?;
        self.release_data()?;
        self.clock_low()?;
        Ok(())
    }

    /// Nine or more clocks with data high bring the interface back to a
    /// known state, followed by a start
    pub fn reset_connection(&mut self) -> Result<(), DeviceError<P::Error>> {
        self.release_data()?;
        for _ in 0..9 {
            self.clock_high()?;
            self.clock_low()?;
        }
        self.start()
    }

    /// Send one byte, msb first, and check the device pulled data low to ack
    pub fn write_byte(&mut self, value: u8) -> Result<(), DeviceError<P::Error>> {
        for i in (0..8).rev() {
            if value & (1 << i) != 0 {
                self.release_data()?;
            } else {
                self.pull_data_low()?;
            }
            self.clock_high()?;
            self.clock_low()?;
        }
        self.release_data()?;
        self.clock_high()?;
        let ack = self.data.read()?;
        self.clock_low()?;
        if ack == Level::High {
            return Err(DeviceError::NoAcknowledge);
        }
        Ok(())
    }

    /// Receive one byte; with `ack` false the transfer is ended by the master
    pub fn read_byte(&mut self, ack: bool) -> Result<u8, DeviceError<P::Error>> {
        self.release_data()?;
        let mut value = 0_u8;
        for _ in 0..8 {
            self.clock_high()?;
            let bit = self.data.read()? == Level::High;
            value = (value << 1) | bit as u8;
            self.clock_low()?;
        }
        if ack {
            self.pull_data_low()?;
        }
        self.clock_high()?;
        self.clock_low()?;
        self.release_data()?;
        Ok(value)
    }

    /// Wait for the device to pull data low, signalling a finished measurement
    pub fn wait_for_data_ready(&mut self, timeout: Duration) -> Result<(), DeviceError<P::Error>> {
        self.release_data()?;
        match timing::wait_for_level(&mut self.data, Level::Low, timeout)? {
            Some(_) => Ok(()),
            None => Err(DeviceError::Timeout("measurement to complete")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPin;

    #[test]
    fn test_write_byte_acked() {
        let data = MockPin::new();
        let clock = MockPin::new();
        let mut bus = SensiBus::new(data.clone(), clock.clone()).unwrap();
        data.queue_input(vec![Level::Low]);
        bus.write_byte(0x03).unwrap();
        // six zero bits are driven low, the two ones are released
        assert_eq!(data.history(), vec![Level::Low; 6]);
        assert_eq!(data.direction(), Direction::Input);
        // initial low plus 9 clock periods
        assert_eq!(clock.history().len(), 1 + 9 * 2);
    }

    #[test]
    fn test_write_byte_nack() {
        let data = MockPin::new();
        let clock = MockPin::new();
        let mut bus = SensiBus::new(data.clone(), clock).unwrap();
        data.queue_input(vec![Level::High]);
        assert!(matches!(bus.write_byte(0x05), Err(DeviceError::NoAcknowledge)));
    }

    #[test]
    fn test_read_byte() {
        let data = MockPin::new();
        let clock = MockPin::new();
        let mut bus = SensiBus::new(data.clone(), clock).unwrap();
        data.queue_bits(0xA7, 8);
        assert_eq!(bus.read_byte(true).unwrap(), 0xA7);
        // the ack is the only level we drive
        assert_eq!(data.history(), vec![Level::Low]);
    }

    #[test]
    fn test_wait_for_data_ready_timeout() {
        let data = MockPin::new();
        let clock = MockPin::new();
        let mut bus = SensiBus::new(data.clone(), clock).unwrap();
        data.queue_input(vec![Level::High]);
        let result = bus.wait_for_data_ready(Duration::from_millis(1));
        assert!(matches!(result, Err(DeviceError::Timeout(_))));
    }
}
