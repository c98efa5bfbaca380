// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! SPI master bit-banged over four GPIO lines
//!
//! Data is placed on MOSI before the leading clock edge and MISO is sampled
//! right after it (SPI mode 0, or mode 2 when the clock idles high).  The
//! chip-select line is active low.

use crate::core::{Direction, GpioPin, Level};
use crate::error::DeviceError;
use crate::timing;
use log::debug;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOrder {
    MsbFirst,
    LsbFirst,
}

#[derive(Debug, Clone, Copy)]
pub struct SoftSpiConfig {
    pub bit_order: BitOrder,
    pub clock_idle_high: bool,
    /// Time each line is given to settle after it changes
    pub settle: Duration,
}

impl Default for SoftSpiConfig {
    fn default() -> SoftSpiConfig {
        SoftSpiConfig {
            bit_order: BitOrder::MsbFirst,
            clock_idle_high: false,
            settle: Duration::from_micros(1),
        }
    }
}

pub struct SoftSpi<P: GpioPin> {
    clock: P,
    mosi: P,
    miso: P,
    cs: P,
    config: SoftSpiConfig,
}

fn check_bit_count<E>(count: u8) -> Result<(), DeviceError<E>> {
    if count == 0 || count > 32 {
        Err(DeviceError::InvalidConfig("bit count must be within 1..=32"))
    } else {
        Ok(())
    }
}

/// Reverse the lowest `count` bits of `value`
fn reverse_low_bits(value: u32, count: u8) -> u32 {
    value.reverse_bits() >> (32 - u32::from(count))
}

impl<P: GpioPin> SoftSpi<P> {
    pub fn new(
        mut clock: P,
        mut mosi: P,
        mut miso: P,
        mut cs: P,
        config: SoftSpiConfig,
    ) -> Result<SoftSpi<P>, DeviceError<P::Error>> {
        clock.set_direction(Direction::Output)?;
        mosi.set_direction(Direction::Output)?;
        miso.set_direction(Direction::Input)?;
        cs.set_direction(Direction::Output)?;

        clock.write(Level::from(config.clock_idle_high))?;
        mosi.write(Level::Low)?;
        cs.write(Level::High)?;
        debug!("software SPI ready: {:?}", config);

        Ok(SoftSpi {
            clock,
            mosi,
            miso,
            cs,
            config,
        })
    }

    pub fn config(&self) -> &SoftSpiConfig {
        &self.config
    }

    fn idle(&self) -> Level {
        Level::from(self.config.clock_idle_high)
    }

    fn settle(&self) {
        timing::delay(self.config.settle);
    }

    pub fn select(&mut self) -> Result<(), DeviceError<P::Error>> {
        self.cs.write(Level::Low)?;
        self.settle();
        Ok(())
    }

    pub fn deselect(&mut self) -> Result<(), DeviceError<P::Error>> {
        self.cs.write(Level::High)?;
        self.settle();
        Ok(())
    }

    /// Run `f` with the chip selected; the chip is deselected even if `f` fails
    pub fn transaction<T, F>(&mut self, f: F) -> Result<T, DeviceError<P::Error>>
    where
        F: FnOnce(&mut Self) -> Result<T, DeviceError<P::Error>>,
    {
        self.select()?;
        let result = f(self);
        self.deselect()?;
        result
    }

    /// Clock one bit out (if `out` is set) and return the bit sampled on MISO
    fn clock_bit(&mut self, out: Option<bool>, sample: bool) -> Result<bool, DeviceError<P::Error>> {
        if let Some(bit) = out {
            self.mosi.write(Level::from(bit))?;
            self.settle();
        }
        let idle = self.idle();
        self.clock.write(!idle)?;
        self.settle();
        let sampled = if sample {
            self.miso.read()? == Level::High
        } else {
            false
        };
        self.clock.write(idle)?;
        self.settle();
        Ok(sampled)
    }

    fn shift(
        &mut self,
        value: Option<u32>,
        count: u8,
        sample: bool,
    ) -> Result<u32, DeviceError<P::Error>> {
        check_bit_count::<P::Error>(count)?;
        let out = match (value, self.config.bit_order) {
            (Some(v), BitOrder::LsbFirst) => Some(reverse_low_bits(v, count)),
            (v, _) => v,
        };
        let mut received = 0_u32;
        for i in (0..count).rev() {
            let bit = out.map(|v| v & (1 << i) != 0);
            let sampled = self.clock_bit(bit, sample)?;
            received = (received << 1) | sampled as u32;
        }
        if self.config.bit_order == BitOrder::LsbFirst {
            received = reverse_low_bits(received, count);
        }
        Ok(received)
    }

    /// Clock out the lowest `count` bits of `value`
    pub fn write_bits(&mut self, value: u32, count: u8) -> Result<(), DeviceError<P::Error>> {
        self.shift(Some(value), count, false).map(drop)
    }

    /// Clock in `count` bits, leaving MOSI untouched
    pub fn read_bits(&mut self, count: u8) -> Result<u32, DeviceError<P::Error>> {
        self.shift(None, count, true)
    }

    /// Full-duplex exchange of `count` bits
    pub fn transfer_bits(&mut self, value: u32, count: u8) -> Result<u32, DeviceError<P::Error>> {
        self.shift(Some(value), count, true)
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> Result<(), DeviceError<P::Error>> {
        for byte in data {
            self.write_bits(u32::from(*byte), 8)?;
        }
        Ok(())
    }

    /// Exchange `data` in place
    pub fn transfer(&mut self, data: &mut [u8]) -> Result<(), DeviceError<P::Error>> {
        for byte in data.iter_mut() {
            *byte = self.transfer_bits(u32::from(*byte), 8)? as u8;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{bits_of, MockPin};

    struct Lines {
        clock: MockPin,
        mosi: MockPin,
        miso: MockPin,
        cs: MockPin,
    }

    fn make_spi(bit_order: BitOrder) -> (SoftSpi<MockPin>, Lines) {
        make_spi_with(SoftSpiConfig {
            bit_order,
            clock_idle_high: false,
            settle: Duration::from_micros(0),
        })
    }

    fn make_spi_with(config: SoftSpiConfig) -> (SoftSpi<MockPin>, Lines) {
        let lines = Lines {
            clock: MockPin::new(),
            mosi: MockPin::new(),
            miso: MockPin::new(),
            cs: MockPin::new(),
        };
        let spi = SoftSpi::new(
            lines.clock.clone(),
            lines.mosi.clone(),
            lines.miso.clone(),
            lines.cs.clone(),
            config,
        )
        .unwrap();
        lines.clock.clear_history();
        lines.mosi.clear_history();
        lines.cs.clear_history();
        (spi, lines)
    }

    #[test]
    fn test_write_msb_first() {
        let (mut spi, lines) = make_spi(BitOrder::MsbFirst);
        spi.write_bits(0b11010, 5).unwrap();
        assert_eq!(bits_of(&lines.mosi.history()), 0b11010);
        assert_eq!(lines.mosi.history().len(), 5);
        // one full clock period per bit, ending idle
        let clock = lines.clock.history();
        assert_eq!(clock.len(), 10);
        assert_eq!(clock.last(), Some(&Level::Low));
        assert_eq!(clock[0], Level::High);
    }

    #[test]
    fn test_clock_idle_high() {
        let (mut spi, lines) = make_spi_with(SoftSpiConfig {
            bit_order: BitOrder::MsbFirst,
            clock_idle_high: true,
            settle: Duration::from_micros(0),
        });
        // the clock was parked high when the bus was set up
        assert_eq!(lines.clock.level(), Level::High);

        lines.miso.queue_bits(0b011, 3);
        let received = spi
            .transaction(|spi| spi.transfer_bits(0b101, 3))
            .unwrap();
        assert_eq!(received, 0b011);
        assert_eq!(bits_of(&lines.mosi.history()), 0b101);
        // each bit pulses low then returns to the high idle level
        assert_eq!(
            lines.clock.history(),
            vec![
                Level::Low,
                Level::High,
                Level::Low,
                Level::High,
                Level::Low,
                Level::High,
            ]
        );
        assert_eq!(lines.cs.history(), vec![Level::Low, Level::High]);
        assert_eq!(lines.miso.pending_input(), 0);
    }

    #[test]
    fn test_write_lsb_first() {
        let (mut spi, lines) = make_spi(BitOrder::LsbFirst);
        spi.write_bits(0b0011, 4).unwrap();
        assert_eq!(bits_of(&lines.mosi.history()), 0b1100);
    }

    #[test]
    fn test_read_bits() {
        let (mut spi, lines) = make_spi(BitOrder::MsbFirst);
        lines.miso.queue_bits(0x2A5, 10);
        assert_eq!(spi.read_bits(10).unwrap(), 0x2A5);
        assert!(lines.mosi.history().is_empty());

        let (mut spi, lines) = make_spi(BitOrder::LsbFirst);
        lines.miso.queue_bits(0b1000, 4);
        assert_eq!(spi.read_bits(4).unwrap(), 0b0001);
    }

    #[test]
    fn test_transfer_bytes() {
        let (mut spi, lines) = make_spi(BitOrder::MsbFirst);
        lines.miso.queue_bits(0xBEEF, 16);
        let mut buf = [0x12, 0x34];
        spi.transfer(&mut buf).unwrap();
        assert_eq!(buf, [0xBE, 0xEF]);
        assert_eq!(bits_of(&lines.mosi.history()), 0x1234);
    }

    #[test]
    fn test_transaction_always_deselects() {
        let (mut spi, lines) = make_spi(BitOrder::MsbFirst);
        let result: Result<(), _> = spi.transaction(|spi| spi.write_bits(0, 0));
        assert!(matches!(result, Err(DeviceError::InvalidConfig(_))));
        assert_eq!(lines.cs.history(), vec![Level::Low, Level::High]);
    }

    #[test]
    fn test_invalid_bit_count() {
        let (mut spi, _lines) = make_spi(BitOrder::MsbFirst);
        assert!(matches!(
            spi.read_bits(33),
            Err(DeviceError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_reverse_low_bits() {
        assert_eq!(reverse_low_bits(0b0001, 4), 0b1000);
        assert_eq!(reverse_low_bits(0x8000_0000, 32), 1);
    }
}
