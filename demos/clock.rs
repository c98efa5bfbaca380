// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

// Shows, sets and starts a DS1307 real-time clock

extern crate chrono;
extern crate docopt;
extern crate pidev;

use chrono::NaiveDateTime;
use docopt::Docopt;
use pidev::devices::ds1307_rtc::{DateTime, Ds1307, DS1307_I2C_ADDR};
use pidev::BoardConfig;
use std::env::args;

const USAGE: &str = "
Reading and setting a DS1307 real-time clock via Linux i2cdev.

Usage:
  clock [--bus=<bus>]
  clock [--bus=<bus>] set <date> <time>
  clock (-h | --help)
  clock --version

Dates are YYYY-MM-DD and times HH:MM:SS.  The weekday register is set
counting Monday as day 1.

Options:
  -h --help       Show this help text.
  --version       Show version.
  --bus=<bus>     I2C bus device [default: /dev/i2c-1].
";

fn parse_datetime(date: &str, time: &str) -> Option<DateTime> {
    let text = format!("{} {}", date, time);
    let naive = NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S").ok()?;
    Some(DateTime::from_naive(&naive))
}

fn main() {
    let args = Docopt::new(USAGE)
        .and_then(|d| d.argv(args()).parse())
        .unwrap_or_else(|e| e.exit());

    // only the I2C bus is used, so the GPIO chip is never opened
    let config = BoardConfig::default().with_i2c_bus(args.get_str("--bus"));
    let device = match pidev::LinuxI2CDevice::new(&config.i2c_bus, DS1307_I2C_ADDR) {
        Ok(device) => device,
        Err(err) => {
            println!("Unable to open {}: {}", config.i2c_bus.display(), err);
            return;
        }
    };
    let mut rtc = Ds1307::new(device);

    if args.get_bool("set") {
        let datetime = match parse_datetime(args.get_str("<date>"), args.get_str("<time>")) {
            Some(datetime) => datetime,
            None => {
                println!("Unable to parse date and time");
                return;
            }
        };
        if let Err(err) = rtc.set_datetime(&datetime) {
            println!("Error: {}", err);
            return;
        }
    }

    match rtc.is_running() {
        Ok(false) => println!("Clock is halted"),
        Ok(true) => {}
        Err(err) => println!("Error: {}", err),
    }
    match rtc.read_datetime() {
        Ok(dt) => println!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02} (day {})",
            dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second, dt.weekday
        ),
        Err(err) => println!("Error: {}", err),
    }
}
