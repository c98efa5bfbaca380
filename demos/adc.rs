// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

// Samples all eight channels of an MCP3008 on a bit-banged SPI bus

extern crate docopt;
extern crate pidev;

use docopt::Docopt;
use pidev::bus::{SoftSpi, SoftSpiConfig};
use pidev::devices::mcp3008_adc::{Mcp3008, CHANNEL_COUNT};
use pidev::pins::{shared, AnalogInputPin};
use pidev::{Board, BoardConfig, LinuxError};
use std::env::args;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

const USAGE: &str = "
Reading an MCP3008 ADC over software SPI.

Usage:
  adc [--chip=<chip>] <clk> <mosi> <miso> <cs>
  adc (-h | --help)
  adc --version

Options:
  -h --help       Show this help text.
  --version       Show version.
  --chip=<chip>   GPIO character device [default: /dev/gpiochip0].
";

fn parse_pin(args: &docopt::ArgvMap, name: &str) -> Option<u32> {
    args.get_str(name).parse().ok()
}

fn main() {
    let args = Docopt::new(USAGE)
        .and_then(|d| d.argv(args()).parse())
        .unwrap_or_else(|e| e.exit());
    let pins: Vec<u32> = ["<clk>", "<mosi>", "<miso>", "<cs>"]
        .iter()
        .filter_map(|name| parse_pin(&args, name))
        .collect();
    if pins.len() != 4 {
        println!("Pins must be GPIO line numbers");
        return;
    }

    let config = BoardConfig::default().with_gpio_chip(args.get_str("--chip"));
    let lines = Board::new(config).and_then(|board| -> Result<_, LinuxError> {
        Ok((
            board.output(pins[0])?,
            board.output(pins[1])?,
            board.input(pins[2])?,
            board.output(pins[3])?,
        ))
    });
    let (clk, mosi, miso, cs) = match lines {
        Ok(lines) => lines,
        Err(err) => {
            println!("Unable to open GPIO lines: {}", err);
            return;
        }
    };
    let spi = match SoftSpi::new(clk, mosi, miso, cs, SoftSpiConfig::default()) {
        Ok(spi) => spi,
        Err(err) => {
            println!("Unable to set up SPI: {}", err);
            return;
        }
    };

    let adc = shared(Mcp3008::new(spi));
    let channels: Vec<_> = (0..CHANNEL_COUNT)
        .map(|ch| AnalogInputPin::new(Rc::clone(&adc), ch))
        .collect();
    loop {
        let readings: Vec<String> = channels
            .iter()
            .map(|pin| match pin.read_normalized() {
                Ok(value) => format!("{:.3}", value),
                Err(_) => "-----".to_owned(),
            })
            .collect();
        println!("{}", readings.join(" "));
        thread::sleep(Duration::from_millis(500));
    }
}
