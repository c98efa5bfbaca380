// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt::Debug;
use thiserror::Error;

/// Error raised by a device driver
///
/// `E` is the error type of the underlying bus or pin.  Parameter
/// validation fails before any bus traffic is generated.
#[derive(Debug, Error)]
pub enum DeviceError<E> {
    #[error("bus error: {0}")]
    Bus(#[from] E),
    #[error("{name} {value} out of range {min}..={max}")]
    OutOfRange {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("checksum mismatch: expected {expected:#04x}, computed {computed:#04x}")]
    Checksum { expected: u8, computed: u8 },
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
    #[error("device did not acknowledge")]
    NoAcknowledge,
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("short read: expected {expected} bytes, received {received}")]
    ShortRead { expected: usize, received: usize },
}

pub type DeviceResult<T, E> = Result<T, DeviceError<E>>;

/// Fail with `OutOfRange` unless `min <= value <= max`
pub fn check_range<E, V>(name: &'static str, value: V, min: V, max: V) -> Result<(), DeviceError<E>>
where
    V: Into<i64> + PartialOrd + Copy,
{
    if value < min || value > max {
        Err(DeviceError::OutOfRange {
            name,
            value: value.into(),
            min: min.into(),
            max: max.into(),
        })
    } else {
        Ok(())
    }
}

/// Fail with `ShortRead` unless `data` holds at least `expected` bytes
pub fn check_len<E>(data: &[u8], expected: usize) -> Result<(), DeviceError<E>> {
    if data.len() < expected {
        Err(DeviceError::ShortRead {
            expected,
            received: data.len(),
        })
    } else {
        Ok(())
    }
}

impl<E: Debug> embedded_hal::digital::Error for DeviceError<E> {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

impl<E: Debug> embedded_hal::pwm::Error for DeviceError<E> {
    fn kind(&self) -> embedded_hal::pwm::ErrorKind {
        embedded_hal::pwm::ErrorKind::Other
    }
}
