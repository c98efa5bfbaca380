// Copyright 2026, The pidev Developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/license/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option.  This file may not be copied, modified, or distributed
// except according to those terms.

//! Hitachi HD44780 character LCD over a 4-bit GPIO interface
//!
//! Only the RS, E and D4-D7 lines are driven; R/W is expected to be tied
//! to ground, so the busy flag is never read and fixed delays are used
//! instead.

#![allow(dead_code)] // instruction set

use crate::core::{Direction, GpioPin, Level};
use crate::error::{check_range, DeviceError};
use crate::timing;
use log::debug;

const CMD_CLEAR_DISPLAY: u8 = 0x01;
const CMD_RETURN_HOME: u8 = 0x02;
const CMD_ENTRY_MODE: u8 = 0x04;
const CMD_DISPLAY_CONTROL: u8 = 0x08;
const CMD_SHIFT: u8 = 0x10;
const CMD_FUNCTION_SET: u8 = 0x20;
const CMD_SET_CGRAM_ADDR: u8 = 0x40;
const CMD_SET_DDRAM_ADDR: u8 = 0x80;

const ENTRY_INCREMENT: u8 = 0x02;

const DISPLAY_ON: u8 = 0x04;
const CURSOR_ON: u8 = 0x02;
const BLINK_ON: u8 = 0x01;

const SHIFT_DISPLAY: u8 = 0x08;
const SHIFT_RIGHT: u8 = 0x04;

const FUNCTION_TWO_LINES: u8 = 0x08;

/// Instruction execution time for everything except clear and home
const EXECUTION_US: u64 = 50;
const CLEAR_MS: u64 = 2;

pub const MAX_COLUMNS: u8 = 40;
pub const MAX_ROWS: u8 = 4;
/// Rows three and four continue lines one and two in the 80 byte DDRAM
pub const MAX_FOUR_ROW_COLUMNS: u8 = 20;
pub const CUSTOM_CHAR_COUNT: u8 = 8;

pub struct Hd44780<P: GpioPin> {
    rs: P,
    en: P,
    data: [P; 4],
    cols: u8,
    rows: u8,
    control: u8,
    col: u8,
    row: u8,
}

impl<P: GpioPin> Hd44780<P> {
    /// Initialise a `cols` x `rows` display wired as `data = [d4, d5, d6, d7]`
    pub fn new(mut rs: P, mut en: P, mut data: [P; 4], cols: u8, rows: u8) -> Result<Hd44780<P>, DeviceError<P::Error>> {
        check_range::<P::Error, _>("columns", cols, 1, MAX_COLUMNS)?;
        check_range::<P::Error, _>("rows", rows, 1, MAX_ROWS)?;
        if rows > 2 && cols > MAX_FOUR_ROW_COLUMNS {
            return Err(DeviceError::InvalidConfig(
                "displays with more than two rows are at most 20 columns wide",
            ));
        }

        rs.set_direction(Direction::Output)?;
        rs.write(Level::Low)?;
        en.set_direction(Direction::Output)?;
        en.write(Level::Low)?;
        for pin in data.iter_mut() {
            pin.set_direction(Direction::Output)?;
        }

        let mut lcd = Hd44780 {
            rs,
            en,
            data,
            cols,
            rows,
            control: DISPLAY_ON,
            col: 0,
            row: 0,
        };
        lcd.initialise()?;
        debug!("HD44780 {}x{} initialised", cols, rows);
        Ok(lcd)
    }

    /// Force the controller into 4-bit mode whatever state it powered up in
    fn initialise(&mut self) -> Result<(), DeviceError<P::Error>> {
        timing::delay_ms(50);
        self.write_nibble(0x03)?;
        timing::delay_us(4500);
        self.write_nibble(0x03)?;
        timing::delay_us(4500);
        self.write_nibble(0x03)?;
        timing::delay_us(150);
        self.write_nibble(0x02)?;

        let lines = if self.rows > 1 { FUNCTION_TWO_LINES } else { 0 };
        self.command(CMD_FUNCTION_SET | lines)?;
        self.command(CMD_DISPLAY_CONTROL | self.control)?;
        self.clear()?;
        self.command(CMD_ENTRY_MODE | ENTRY_INCREMENT)
    }

    fn pulse_enable(&mut self) -> Result<(), DeviceError<P::Error>> {
        self.en.write(Level::High)?;
        timing::delay_us(1);
        self.en.write(Level::Low)?;
        timing::delay_us(EXECUTION_US);
        Ok(())
    }

    fn write_nibble(&mut self, nibble: u8) -> Result<(), DeviceError<P::Error>> {
        for (i, pin) in self.data.iter_mut().enumerate() {
            pin.write(Level::from(nibble & (1 << i) != 0))?;
        }
        self.pulse_enable()
    }

    fn write_byte(&mut self, value: u8, rs: Level) -> Result<(), DeviceError<P::Error>> {
        self.rs.write(rs)?;
        self.write_nibble(value >> 4)?;
        self.write_nibble(value & 0x0F)
    }

    fn command(&mut self, command: u8) -> Result<(), DeviceError<P::Error>> {
        self.write_byte(command, Level::Low)
    }

    fn ddram_address(&self, col: u8, row: u8) -> u8 {
        // rows 2 and 3 continue where rows 0 and 1 end
        let base = match row {
            0 => 0x00,
            1 => 0x40,
            2 => self.cols,
            _ => 0x40 + self.cols,
        };
        base + col
    }

    pub fn geometry(&self) -> (u8, u8) {
        (self.cols, self.rows)
    }

    /// Blank the display and return the cursor to the top left
    pub fn clear(&mut self) -> Result<(), DeviceError<P::Error>> {
        self.command(CMD_CLEAR_DISPLAY)?;
        timing::delay_ms(CLEAR_MS);
        self.col = 0;
        self.row = 0;
        Ok(())
    }

    /// Return the cursor to the top left and undo any scrolling
    pub fn home(&mut self) -> Result<(), DeviceError<P::Error>> {
        self.command(CMD_RETURN_HOME)?;
        timing::delay_ms(CLEAR_MS);
        self.col = 0;
        self.row = 0;
        Ok(())
    }

    pub fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), DeviceError<P::Error>> {
        check_range::<P::Error, _>("column", col, 0, self.cols - 1)?;
        check_range::<P::Error, _>("row", row, 0, self.rows - 1)?;
        let address = self.ddram_address(col, row);
        self.command(CMD_SET_DDRAM_ADDR | address)?;
        self.col = col;
        self.row = row;
        Ok(())
    }

    pub fn cursor_position(&self) -> (u8, u8) {
        (self.col, self.row)
    }

    /// Write a character at the cursor
    ///
    /// Characters outside the controller's 8-bit table are shown as `?`.
    pub fn write_char(&mut self, c: char) -> Result<(), DeviceError<P::Error>> {
        let code = c as u32;
        let byte = if code <= 0xFF { code as u8 } else { b'?' };
        self.write_byte(byte, Level::High)?;
        self.col = self.col.saturating_add(1);
        Ok(())
    }

    /// Write a string at the cursor; `\n` moves to the start of the next row
    pub fn write_str(&mut self, s: &str) -> Result<(), DeviceError<P::Error>> {
        for c in s.chars() {
            if c == '\n' {
                let row = (self.row + 1) % self.rows;
                self.set_cursor(0, row)?;
            } else {
                self.write_char(c)?;
            }
        }
        Ok(())
    }

    fn update_control(&mut self, flag: u8, on: bool) -> Result<(), DeviceError<P::Error>> {
        if on {
            self.control |= flag;
        } else {
            self.control &= !flag;
        }
        self.command(CMD_DISPLAY_CONTROL | self.control)
    }

    /// Turn the display on or off; display RAM is kept either way
    pub fn display(&mut self, on: bool) -> Result<(), DeviceError<P::Error>> {
        self.update_control(DISPLAY_ON, on)
    }

    /// Show or hide the underline cursor
    pub fn cursor(&mut self, on: bool) -> Result<(), DeviceError<P::Error>> {
        self.update_control(CURSOR_ON, on)
    }

    /// Blink the character at the cursor
    pub fn blink(&mut self, on: bool) -> Result<(), DeviceError<P::Error>> {
        self.update_control(BLINK_ON, on)
    }

    pub fn scroll_left(&mut self) -> Result<(), DeviceError<P::Error>> {
        self.command(CMD_SHIFT | SHIFT_DISPLAY)
    }

    pub fn scroll_right(&mut self) -> Result<(), DeviceError<P::Error>> {
        self.command(CMD_SHIFT | SHIFT_DISPLAY | SHIFT_RIGHT)
    }

    /// Define custom character `location` (0-7) from 8 rows of 5 pixels
    ///
    /// The character is then printed with `write_char(location as char)`.
    pub fn create_char(&mut self, location: u8, pattern: [u8; 8]) -> Result<(), DeviceError<P::Error>> {
        check_range::<P::Error, _>("character location", location, 0, CUSTOM_CHAR_COUNT - 1)?;
        self.command(CMD_SET_CGRAM_ADDR | (location << 3))?;
        for row in pattern.iter() {
            self.write_byte(row & 0x1F, Level::High)?;
        }
        // back to display RAM where the cursor was
        let address = self.ddram_address(self.col.min(self.cols - 1), self.row);
        self.command(CMD_SET_DDRAM_ADDR | address)
    }

    pub fn release(self) -> (P, P, [P; 4]) {
        (self.rs, self.en, self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPin;

    struct Wiring {
        rs: MockPin,
        en: MockPin,
        data: [MockPin; 4],
    }

    impl Wiring {
        fn new() -> Wiring {
            Wiring {
                rs: MockPin::new(),
                en: MockPin::new(),
                data: [MockPin::new(), MockPin::new(), MockPin::new(), MockPin::new()],
            }
        }

        fn lcd(&self, cols: u8, rows: u8) -> Hd44780<MockPin> {
            Hd44780::new(self.rs.clone(), self.en.clone(), self.data.clone(), cols, rows).unwrap()
        }

        /// Every nibble put on D4-D7 so far
        fn nibbles(&self) -> Vec<u8> {
            let hist: Vec<Vec<Level>> = self.data.iter().map(|p| p.history()).collect();
            (0..hist[0].len())
                .map(|n| {
                    (0..4).fold(0, |acc, i| acc | (((hist[i][n] == Level::High) as u8) << i))
                })
                .collect()
        }

        /// Full bytes sent after the 4-bit handshake
        fn bytes(&self) -> Vec<u8> {
            self.nibbles()[4..]
                .chunks(2)
                .map(|pair| (pair[0] << 4) | pair[1])
                .collect()
        }

        fn clear(&self) {
            self.rs.clear_history();
            self.en.clear_history();
            for pin in self.data.iter() {
                pin.clear_history();
            }
        }
    }

    #[test]
    fn test_init_sequence() {
        let wiring = Wiring::new();
        let _lcd = wiring.lcd(16, 2);
        assert_eq!(&wiring.nibbles()[..4], &[0x03, 0x03, 0x03, 0x02]);
        assert_eq!(wiring.bytes(), vec![0x28, 0x0C, 0x01, 0x06]);
        // one enable pulse per nibble after the initial low
        assert_eq!(wiring.en.history().len(), 1 + 12 * 2);
    }

    #[test]
    fn test_single_line_function_set() {
        let wiring = Wiring::new();
        let _lcd = wiring.lcd(8, 1);
        assert_eq!(wiring.bytes()[0], 0x20);
    }

    #[test]
    fn test_write_str() {
        let wiring = Wiring::new();
        let mut lcd = wiring.lcd(16, 2);
        wiring.clear();
        lcd.write_str("Hi\nA").unwrap();
        let nibbles = wiring.nibbles();
        let bytes: Vec<u8> = nibbles.chunks(2).map(|p| (p[0] << 4) | p[1]).collect();
        assert_eq!(bytes, vec![b'H', b'i', 0xC0, b'A']);
        assert_eq!(
            wiring.rs.history(),
            vec![Level::High, Level::High, Level::Low, Level::High]
        );
        assert_eq!(lcd.cursor_position(), (1, 1));
    }

    #[test]
    fn test_set_cursor() {
        let wiring = Wiring::new();
        let mut lcd = wiring.lcd(20, 4);
        wiring.clear();
        lcd.set_cursor(3, 1).unwrap();
        lcd.set_cursor(0, 2).unwrap();
        lcd.set_cursor(19, 3).unwrap();
        assert!(lcd.set_cursor(20, 0).is_err());
        assert!(lcd.set_cursor(0, 4).is_err());
        let nibbles = wiring.nibbles();
        let bytes: Vec<u8> = nibbles.chunks(2).map(|p| (p[0] << 4) | p[1]).collect();
        assert_eq!(bytes, vec![0xC3, 0x94, 0xE7]);
    }

    #[test]
    fn test_display_toggles() {
        let wiring = Wiring::new();
        let mut lcd = wiring.lcd(16, 2);
        wiring.clear();
        lcd.cursor(true).unwrap();
        lcd.blink(true).unwrap();
        lcd.display(false).unwrap();
        lcd.scroll_left().unwrap();
        lcd.scroll_right().unwrap();
        let nibbles = wiring.nibbles();
        let bytes: Vec<u8> = nibbles.chunks(2).map(|p| (p[0] << 4) | p[1]).collect();
        assert_eq!(bytes, vec![0x0E, 0x0F, 0x0B, 0x18, 0x1C]);
    }

    #[test]
    fn test_create_char() {
        let wiring = Wiring::new();
        let mut lcd = wiring.lcd(16, 2);
        assert!(lcd.create_char(8, [0; 8]).is_err());
        wiring.clear();
        lcd.create_char(1, [0xFF, 0x11, 0, 0, 0, 0, 0, 0x1F]).unwrap();
        let nibbles = wiring.nibbles();
        let bytes: Vec<u8> = nibbles.chunks(2).map(|p| (p[0] << 4) | p[1]).collect();
        assert_eq!(bytes, vec![0x48, 0x1F, 0x11, 0, 0, 0, 0, 0, 0x1F, 0x80]);
    }

    #[test]
    fn test_bad_geometry() {
        let wiring = Wiring::new();
        let result = Hd44780::new(wiring.rs.clone(), wiring.en.clone(), wiring.data.clone(), 16, 5);
        assert!(matches!(result, Err(DeviceError::OutOfRange { .. })));
    }

    #[test]
    fn test_wide_four_row_geometry() {
        let wiring = Wiring::new();
        let result = Hd44780::new(wiring.rs.clone(), wiring.en.clone(), wiring.data.clone(), 40, 4);
        assert!(matches!(result, Err(DeviceError::InvalidConfig(_))));
        // rejected before any pin is touched
        assert!(wiring.en.history().is_empty());

        let result = Hd44780::new(wiring.rs.clone(), wiring.en.clone(), wiring.data.clone(), 21, 3);
        assert!(matches!(result, Err(DeviceError::InvalidConfig(_))));

        let mut lcd = wiring.lcd(40, 2);
        wiring.clear();
        lcd.set_cursor(39, 1).unwrap();
        let bytes: Vec<u8> = wiring.nibbles().chunks(2).map(|p| (p[0] << 4) | p[1]).collect();
        assert_eq!(bytes, vec![0x80 | 0x67]);
    }
}
