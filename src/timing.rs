// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! Delays for timing-sensitive protocols
//!
//! The scheduler cannot be trusted for waits of a few microseconds, so
//! short delays spin on the monotonic clock instead of sleeping.

use crate::core::{GpioPin, Level};
use std::thread;
use std::time::{Duration, Instant};

const SPIN_THRESHOLD: Duration = Duration::from_micros(100);

pub fn delay(duration: Duration) {
    if duration >= SPIN_THRESHOLD {
        thread::sleep(duration);
    } else {
        let start = Instant::now();
        while start.elapsed() < duration {}
    }
}

pub fn delay_us(micros: u64) {
    delay(Duration::from_micros(micros))
}

pub fn delay_ms(millis: u64) {
    thread::sleep(Duration::from_millis(millis))
}

/// Poll `pin` until it reads `level`
///
/// Returns the time spent waiting, or `None` if `timeout` expired first.
pub fn wait_for_level<P: GpioPin>(
    pin: &mut P,
    level: Level,
    timeout: Duration,
) -> Result<Option<Duration>, P::Error> {
    let start = Instant::now();
    loop {
        if pin.read()? == level {
            return Ok(Some(start.elapsed()));
        }
        if start.elapsed() > timeout {
            return Ok(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPin;

    #[test]
    fn short_delays_are_honoured() {
        let start = Instant::now();
        delay_us(20);
        assert!(start.elapsed() >= Duration::from_micros(20));
    }

    #[test]
    fn wait_for_level_sees_queued_edge() {
        let mut pin = MockPin::new();
        pin.queue_input(vec![Level::Low, Level::Low, Level::High]);
        let waited = wait_for_level(&mut pin, Level::High, Duration::from_millis(10)).unwrap();
        assert!(waited.is_some());
        assert_eq!(pin.pending_input(), 0);
    }

    #[test]
    fn wait_for_level_times_out() {
        let mut pin = MockPin::new();
        let waited = wait_for_level(&mut pin, Level::High, Duration::from_millis(2)).unwrap();
        assert!(waited.is_none());
    }
}
