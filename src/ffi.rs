// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

#![allow(non_camel_case_types)]

use bitflags::bitflags;
use byteorder::{ByteOrder, NativeEndian};
use libc::c_char;
use std::mem;
use std::os::unix::prelude::*;

pub type FfiError = nix::Error;

// i2c-dev, from include/uapi/linux/i2c-dev.h and i2c.h

/// As specified in SMBus standard
const I2C_SMBUS_BLOCK_MAX: usize = 32;

const I2C_SLAVE: u16 = 0x0703;
const I2C_SMBUS: u16 = 0x0720;

// In C this is a union; the block is the largest member.
//
// union i2c_smbus_data {
//     __u8 byte;
//     __u16 word;
//     __u8 block[I2C_SMBUS_BLOCK_MAX + 2]; /* block[0] is used for length */
// };
#[repr(C)]
pub struct i2c_smbus_data {
    block: [u8; I2C_SMBUS_BLOCK_MAX + 2],
}

impl i2c_smbus_data {
    fn empty() -> i2c_smbus_data {
        unsafe { mem::zeroed() }
    }
}

#[repr(u8)]
enum I2CSMBusReadWrite {
    I2C_SMBUS_READ = 1,
    I2C_SMBUS_WRITE = 0,
}

#[repr(u32)]
enum I2CSMBusSize {
    I2C_SMBUS_BYTE = 1,
    I2C_SMBUS_BYTE_DATA = 2,
    I2C_SMBUS_WORD_DATA = 3,
    I2C_SMBUS_I2C_BLOCK_DATA = 8,
}

/// This is the structure as used in the I2C_SMBUS ioctl call
#[repr(C)]
#[allow(dead_code)] // read by the kernel
pub struct i2c_smbus_ioctl_data {
    read_write: u8,
    command: u8,
    size: u32,
    data: *mut i2c_smbus_data,
}

// gpio-cdev v1 ABI, from include/uapi/linux/gpio.h

pub const GPIOHANDLES_MAX: usize = 64;
const GPIO_IOC_MAGIC: u8 = 0xB4;

bitflags! {
    /// Direction flags for a GPIO line handle request
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LineRequestFlags: u32 {
        const INPUT = 1 << 0;
        const OUTPUT = 1 << 1;
    }
}

#[repr(C)]
#[allow(dead_code)] // label and defaults are read by the kernel
pub struct gpiohandle_request {
    pub lineoffsets: [u32; GPIOHANDLES_MAX],
    pub flags: u32,
    pub default_values: [u8; GPIOHANDLES_MAX],
    pub consumer_label: [c_char; 32],
    pub lines: u32,
    pub fd: libc::c_int,
}

#[repr(C)]
pub struct gpiohandle_data {
    pub values: [u8; GPIOHANDLES_MAX],
}

mod ioctl {
    use super::{gpiohandle_data, gpiohandle_request, i2c_smbus_ioctl_data};
    use super::{GPIO_IOC_MAGIC, I2C_SLAVE, I2C_SMBUS};

    nix::ioctl_write_int_bad!(set_i2c_slave_address, I2C_SLAVE);
    nix::ioctl_write_ptr_bad!(i2c_smbus, I2C_SMBUS, i2c_smbus_ioctl_data);

    nix::ioctl_readwrite!(gpio_get_linehandle, GPIO_IOC_MAGIC, 0x03, gpiohandle_request);
    nix::ioctl_readwrite!(gpiohandle_get_line_values, GPIO_IOC_MAGIC, 0x08, gpiohandle_data);
    nix::ioctl_readwrite!(gpiohandle_set_line_values, GPIO_IOC_MAGIC, 0x09, gpiohandle_data);
}

pub fn i2c_set_slave_address(fd: RawFd, slave_address: u16) -> Result<(), FfiError> {
    unsafe {
        ioctl::set_i2c_slave_address(fd, i32::from(slave_address))?;
    }
    Ok(())
}

unsafe fn i2c_smbus_access(
    fd: RawFd,
    read_write: I2CSMBusReadWrite,
    command: u8, // register, or the data byte for I2C_SMBUS_BYTE writes
    size: I2CSMBusSize,
    data: *mut i2c_smbus_data,
) -> Result<(), FfiError> {
    let args = i2c_smbus_ioctl_data {
        read_write: read_write as u8,
        command,
        size: size as u32,
        data,
    };
    ioctl::i2c_smbus(fd, &args).map(drop)
}

pub fn i2c_smbus_read_byte(fd: RawFd) -> Result<u8, FfiError> {
    let mut data = i2c_smbus_data::empty();
    unsafe {
        i2c_smbus_access(
            fd,
            I2CSMBusReadWrite::I2C_SMBUS_READ,
            0,
            I2CSMBusSize::I2C_SMBUS_BYTE,
            &mut data,
        )?;
    }
    Ok(data.block[0])
}

pub fn i2c_smbus_write_byte(fd: RawFd, value: u8) -> Result<(), FfiError> {
    unsafe {
        i2c_smbus_access(
            fd,
            I2CSMBusReadWrite::I2C_SMBUS_WRITE,
            value,
            I2CSMBusSize::I2C_SMBUS_BYTE,
            std::ptr::null_mut(),
        )
    }
}

pub fn i2c_smbus_read_byte_data(fd: RawFd, register: u8) -> Result<u8, FfiError> {
    let mut data = i2c_smbus_data::empty();
    unsafe {
        i2c_smbus_access(
            fd,
            I2CSMBusReadWrite::I2C_SMBUS_READ,
            register,
            I2CSMBusSize::I2C_SMBUS_BYTE_DATA,
            &mut data,
        )?;
    }
    Ok(data.block[0])
}

pub fn i2c_smbus_write_byte_data(fd: RawFd, register: u8, value: u8) -> Result<(), FfiError> {
    let mut data = i2c_smbus_data::empty();
    data.block[0] = value;
    unsafe {
        i2c_smbus_access(
            fd,
            I2CSMBusReadWrite::I2C_SMBUS_WRITE,
            register,
            I2CSMBusSize::I2C_SMBUS_BYTE_DATA,
            &mut data,
        )
    }
}

pub fn i2c_smbus_read_word_data(fd: RawFd, register: u8) -> Result<u16, FfiError> {
    let mut data = i2c_smbus_data::empty();
    unsafe {
        i2c_smbus_access(
            fd,
            I2CSMBusReadWrite::I2C_SMBUS_READ,
            register,
            I2CSMBusSize::I2C_SMBUS_WORD_DATA,
            &mut data,
        )?;
    }
    Ok(NativeEndian::read_u16(&data.block[..2]))
}

pub fn i2c_smbus_write_word_data(fd: RawFd, register: u8, value: u16) -> Result<(), FfiError> {
    let mut data = i2c_smbus_data::empty();
    NativeEndian::write_u16(&mut data.block[..2], value);
    unsafe {
        i2c_smbus_access(
            fd,
            I2CSMBusReadWrite::I2C_SMBUS_WRITE,
            register,
            I2CSMBusSize::I2C_SMBUS_WORD_DATA,
            &mut data,
        )
    }
}

pub fn i2c_smbus_read_i2c_block_data(fd: RawFd, register: u8, len: u8) -> Result<Vec<u8>, FfiError> {
    let mut data = i2c_smbus_data::empty();
    data.block[0] = len.min(I2C_SMBUS_BLOCK_MAX as u8);
    unsafe {
        i2c_smbus_access(
            fd,
            I2CSMBusReadWrite::I2C_SMBUS_READ,
            register,
            I2CSMBusSize::I2C_SMBUS_I2C_BLOCK_DATA,
            &mut data,
        )?;
    }
    // block[0] holds the count actually transferred
    let count = (data.block[0] as usize).min(I2C_SMBUS_BLOCK_MAX);
    Ok(data.block[1..=count].to_vec())
}

pub fn i2c_smbus_write_i2c_block_data(fd: RawFd, register: u8, values: &[u8]) -> Result<(), FfiError> {
    let mut data = i2c_smbus_data::empty();
    let len = values.len().min(I2C_SMBUS_BLOCK_MAX);
    data.block[0] = len as u8;
    data.block[1..=len].copy_from_slice(&values[..len]);
    unsafe {
        i2c_smbus_access(
            fd,
            I2CSMBusReadWrite::I2C_SMBUS_WRITE,
            register,
            I2CSMBusSize::I2C_SMBUS_I2C_BLOCK_DATA,
            &mut data,
        )
    }
}

/// Request a single line from a GPIO chip, returning the handle's fd
pub fn gpio_request_line(
    chip_fd: RawFd,
    offset: u32,
    flags: LineRequestFlags,
    default_value: u8,
    consumer: &str,
) -> Result<RawFd, FfiError> {
    let mut request = gpiohandle_request {
        lineoffsets: [0; GPIOHANDLES_MAX],
        flags: flags.bits(),
        default_values: [0; GPIOHANDLES_MAX],
        consumer_label: [0; 32],
        lines: 1,
        fd: 0,
    };
    request.lineoffsets[0] = offset;
    request.default_values[0] = default_value;
    // leave room for the nul terminator
    for (dst, src) in request
        .consumer_label
        .iter_mut()
        .zip(consumer.bytes().take(31))
    {
        *dst = src as c_char;
    }
    unsafe {
        ioctl::gpio_get_linehandle(chip_fd, &mut request)?;
    }
    Ok(request.fd)
}

pub fn gpio_get_value(handle_fd: RawFd) -> Result<u8, FfiError> {
    let mut data = gpiohandle_data {
        values: [0; GPIOHANDLES_MAX],
    };
    unsafe {
        ioctl::gpiohandle_get_line_values(handle_fd, &mut data)?;
    }
    Ok(data.values[0])
}

pub fn gpio_set_value(handle_fd: RawFd, value: u8) -> Result<(), FfiError> {
    let mut data = gpiohandle_data {
        values: [0; GPIOHANDLES_MAX],
    };
    data.values[0] = value;
    unsafe {
        ioctl::gpiohandle_set_line_values(handle_fd, &mut data)?;
    }
    Ok(())
}
