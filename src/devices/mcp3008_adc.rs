// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! Microchip MCP3008 8-channel 10-bit ADC on a bit-banged SPI bus
//!
//! A conversion is requested with five bits: a start bit, the
//! single-ended/differential flag and the three channel select bits.  DOUT
//! changes on falling clock edges, so the bit sampled on the next clock is
//! still high impedance while the input is sampled; a null bit and ten data
//! bits, msb first, follow it.

use crate::bus::SoftSpi;
use crate::core::GpioPin;
use crate::devices::AnalogInput;
use crate::error::{check_range, DeviceError};

pub const CHANNEL_COUNT: u8 = 8;
pub const RESOLUTION_BITS: u8 = 10;

const START_BIT: u32 = 0b10000;
const SINGLE_ENDED: u32 = 0b01000;

/// The five command bits for a conversion on `channel`
fn command_bits(channel: u8, single_ended: bool) -> u32 {
    let mode = if single_ended { SINGLE_ENDED } else { 0 };
    START_BIT | mode | u32::from(channel & 0x07)
}

pub struct Mcp3008<P: GpioPin> {
    spi: SoftSpi<P>,
}

impl<P: GpioPin> Mcp3008<P> {
    pub fn new(spi: SoftSpi<P>) -> Mcp3008<P> {
        Mcp3008 { spi }
    }

    fn convert(&mut self, channel: u8, single_ended: bool) -> Result<u16, DeviceError<P::Error>> {
        check_range::<P::Error, _>("channel", channel, 0, CHANNEL_COUNT - 1)?;
        let command = command_bits(channel, single_ended);
        let raw = self.spi.transaction(|spi| {
            spi.write_bits(command, 5)?;
            // sample clock, null bit, then the data
            spi.read_bits(2 + RESOLUTION_BITS)
        })?;
        Ok((raw & 0x3FF) as u16)
    }

    /// Single-ended conversion of `channel` (0-7)
    pub fn read(&mut self, channel: u8) -> Result<u16, DeviceError<P::Error>> {
        self.convert(channel, true)
    }

    /// Pseudo-differential conversion
    ///
    /// `pair` selects CH0-CH1 (0), CH1-CH0 (1), CH2-CH3 (2) and so on.
    pub fn read_differential(&mut self, pair: u8) -> Result<u16, DeviceError<P::Error>> {
        self.convert(pair, false)
    }

    pub fn release(self) -> SoftSpi<P> {
        self.spi
    }
}

impl<P: GpioPin> AnalogInput for Mcp3008<P>
where
    P::Error: 'static,
{
    type Error = DeviceError<P::Error>;

    fn channel_count(&self) -> u8 {
        CHANNEL_COUNT
    }

    fn resolution_bits(&self) -> u8 {
        RESOLUTION_BITS
    }

    fn read_channel(&mut self, channel: u8) -> Result<u16, Self::Error> {
        self.read(channel)
    }
}
