// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! Where the hardware lives on a particular board
//!
//! Nothing is probed; a [`BoardConfig`] names the device nodes and the
//! number of usable GPIO lines, and [`Board`] opens connections from it.

use crate::core::Direction;
use crate::linux::{LinuxError, LinuxGpioChip, LinuxGpioLine, LinuxI2CDevice};
use log::debug;
use std::path::{Path, PathBuf};

/// GPIO lines 0-27 are routed to the 40 pin header
pub const HEADER_GPIO_COUNT: u32 = 28;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    pub i2c_bus: PathBuf,
    pub gpio_chip: PathBuf,
    pub gpio_count: u32,
    /// Label the kernel shows for lines we hold
    pub consumer: String,
}

impl Default for BoardConfig {
    fn default() -> BoardConfig {
        BoardConfig {
            i2c_bus: PathBuf::from("/dev/i2c-1"),
            gpio_chip: PathBuf::from("/dev/gpiochip0"),
            gpio_count: HEADER_GPIO_COUNT,
            consumer: "pidev".to_owned(),
        }
    }
}

impl BoardConfig {
    pub fn with_i2c_bus<P: AsRef<Path>>(mut self, path: P) -> BoardConfig {
        self.i2c_bus = path.as_ref().to_path_buf();
        self
    }

    pub fn with_gpio_chip<P: AsRef<Path>>(mut self, path: P) -> BoardConfig {
        self.gpio_chip = path.as_ref().to_path_buf();
        self
    }

    pub fn with_gpio_count(mut self, count: u32) -> BoardConfig {
        self.gpio_count = count;
        self
    }

    pub fn with_consumer(mut self, consumer: &str) -> BoardConfig {
        self.consumer = consumer.to_owned();
        self
    }

    /// Fail with `InvalidPin` unless `pin` is one of the usable lines
    pub fn check_pin(&self, pin: u32) -> Result<(), LinuxError> {
        if pin < self.gpio_count {
            Ok(())
        } else {
            Err(LinuxError::InvalidPin {
                pin,
                count: self.gpio_count,
            })
        }
    }
}

pub struct Board {
    config: BoardConfig,
    chip: LinuxGpioChip,
}

impl Board {
    pub fn new(config: BoardConfig) -> Result<Board, LinuxError> {
        let chip = LinuxGpioChip::open(&config.gpio_chip)?;
        debug!(
            "board ready: i2c {}, gpio {} ({} lines)",
            config.i2c_bus.display(),
            config.gpio_chip.display(),
            config.gpio_count
        );
        Ok(Board { config, chip })
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Open the device at `address` on the configured I2C bus
    pub fn i2c_device(&self, address: u16) -> Result<LinuxI2CDevice, LinuxError> {
        LinuxI2CDevice::new(&self.config.i2c_bus, address)
    }

    fn line(&self, pin: u32, direction: Direction) -> Result<LinuxGpioLine, LinuxError> {
        self.config.check_pin(pin)?;
        self.chip.request_line(pin, direction, &self.config.consumer)
    }

    pub fn input(&self, pin: u32) -> Result<LinuxGpioLine, LinuxError> {
        self.line(pin, Direction::Input)
    }

    /// Claim `pin` as an output, initially driven low
    pub fn output(&self, pin: u32) -> Result<LinuxGpioLine, LinuxError> {
        self.line(pin, Direction::Output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BoardConfig::default();
        assert_eq!(config.i2c_bus, PathBuf::from("/dev/i2c-1"));
        assert_eq!(config.gpio_chip, PathBuf::from("/dev/gpiochip0"));
        assert_eq!(config.gpio_count, 28);
        assert_eq!(config.consumer, "pidev");
    }

    #[test]
    fn test_builder() {
        let config = BoardConfig::default()
            .with_i2c_bus("/dev/i2c-0")
            .with_gpio_chip("/dev/gpiochip4")
            .with_gpio_count(54)
            .with_consumer("weather");
        assert_eq!(config.i2c_bus, PathBuf::from("/dev/i2c-0"));
        assert_eq!(config.gpio_chip, PathBuf::from("/dev/gpiochip4"));
        assert_eq!(config.gpio_count, 54);
        assert_eq!(config.consumer, "weather");
    }

    #[test]
    fn test_check_pin() {
        let config = BoardConfig::default();
        assert!(config.check_pin(27).is_ok());
        match config.check_pin(28) {
            Err(LinuxError::InvalidPin { pin, count }) => assert_eq!((pin, count), (28, 28)),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_chip() {
        let config = BoardConfig::default().with_gpio_chip("/nonexistent/gpiochip");
        assert!(matches!(Board::new(config), Err(LinuxError::Io(_))));
    }
}
