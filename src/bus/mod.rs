// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! Buses implemented in software on top of plain GPIO lines

pub mod sensibus;
pub mod soft_spi;

pub use self::sensibus::SensiBus;
pub use self::soft_spi::{BitOrder, SoftSpi, SoftSpiConfig};
