// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

// Reads a DHT11 or DHT22 temperature/humidity sensor on a GPIO line

extern crate docopt;
extern crate pidev;

use docopt::Docopt;
use pidev::devices::dht_thermometer::{Dht, DhtKind};
use pidev::{Board, BoardConfig};
use std::env::args;
use std::thread;

const USAGE: &str = "
Reading a DHT temperature/humidity sensor via the Linux GPIO character device.

Usage:
  thermometer [--chip=<chip>] [--dht11] <pin>
  thermometer (-h | --help)
  thermometer --version

Options:
  -h --help       Show this help text.
  --version       Show version.
  --chip=<chip>   GPIO character device [default: /dev/gpiochip0].
  --dht11         The sensor is a DHT11 rather than a DHT22.
";

fn main() {
    let args = Docopt::new(USAGE)
        .and_then(|d| d.argv(args()).parse())
        .unwrap_or_else(|e| e.exit());
    let pin: u32 = match args.get_str("<pin>").parse() {
        Ok(pin) => pin,
        Err(_) => {
            println!("Invalid pin {:?}", args.get_str("<pin>"));
            return;
        }
    };
    let kind = if args.get_bool("--dht11") {
        DhtKind::Dht11
    } else {
        DhtKind::Dht22
    };

    let config = BoardConfig::default().with_gpio_chip(args.get_str("--chip"));
    let line = match Board::new(config).and_then(|board| board.input(pin)) {
        Ok(line) => line,
        Err(err) => {
            println!("Unable to open GPIO {}: {}", pin, err);
            return;
        }
    };
    let mut dht = match Dht::new(line, kind) {
        Ok(dht) => dht,
        Err(err) => {
            println!("Unable to set up sensor: {}", err);
            return;
        }
    };

    loop {
        match dht.read() {
            Ok(reading) => println!(
                "{:.1} C  {:.1} %RH",
                reading.temperature_celsius, reading.relative_humidity
            ),
            Err(err) => println!("Error: {}", err),
        }
        thread::sleep(kind.sampling_period());
    }
}
