// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! # pidev
//!
//! The `pidev` crate drives Raspberry Pi GPIO lines, I2C buses and the
//! peripheral chips commonly wired to them.  The Linux backends use the
//! kernel's userspace interfaces:
//! https://www.kernel.org/doc/Documentation/i2c/dev-interface and the GPIO
//! character device.
//!
//! Drivers are generic over the [`I2CDevice`] and [`GpioPin`] traits, so
//! they run equally well against the in-memory stand-ins in [`mock`].

pub mod board;
pub mod bus;
pub mod core;
pub mod devices;
pub mod error;
mod ffi;
pub mod linux;
pub mod mock;
pub mod pins;
pub mod timing;

pub use crate::board::{Board, BoardConfig};
pub use crate::core::{Direction, GpioPin, I2CDevice, Level};
pub use crate::error::{DeviceError, DeviceResult};
pub use crate::linux::{LinuxError, LinuxGpioChip, LinuxGpioLine, LinuxI2CDevice};
