//! CBUS pin discovery and the logical-to-physical pin table.
//!
//! Only lines whose EEPROM function is IO mode can be used as GPIO, so the
//! physical CBUS lines behind the pins are sparse. [`discover_pins`] walks
//! the five lines in order and hands out dense logical indices to the IO
//! lines; [`PinMap`] then answers "which CBUS bit is pin `n`?".
//!
//! # Example
//!
//! ```
//! use ftdi_cbus::{discover_pins, EepromImage};
//!
//! let mut raw = [0u8; 256];
//! raw[0x14] = 0xA3; // CBUS0 = TXLED, CBUS1 = IO
//! raw[0x15] = 0x0A; // CBUS2 = IO
//! let map = discover_pins(&EepromImage::from_bytes(&raw));
//!
//! assert_eq!(map.count(), 2);
//! assert_eq!(map.physical_bit(0)?, 0x02);
//! assert_eq!(map.physical_bit(1)?, 0x04);
//! # Ok::<(), ftdi_cbus::Error>(())
//! ```

use crate::constants::CBUS_LINE_COUNT;
use crate::eeprom::EepromImage;
use crate::error::{Error, Result};

/// Immutable mapping from logical pin index to physical CBUS line.
///
/// Logical indices are dense and assigned in ascending physical line order.
/// Lines are stored in a fixed arena; the table never grows after discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PinMap {
    lines: [u8; CBUS_LINE_COUNT],
    len: usize,
}

impl PinMap {
    /// Build a map from physical line numbers.
    ///
    /// # Panics
    ///
    /// Panics if a line is out of range (> 4), or if `lines` is not strictly
    /// ascending.
    pub fn from_lines(lines: &[u8]) -> Self {
        let mut map = Self::default();
        for &line in lines {
            map.push(line);
        }
        map
    }

    fn push(&mut self, line: u8) {
        assert!(
            (line as usize) < CBUS_LINE_COUNT,
            "CBUS line must be 0-4, got {}",
            line
        );
        if let Some(&last) = self.lines[..self.len].last() {
            assert!(line > last, "CBUS lines must be strictly ascending");
        }
        self.lines[self.len] = line;
        self.len += 1;
    }

    /// Number of usable pins.
    pub fn count(&self) -> usize {
        self.len
    }

    /// Whether no CBUS line is in IO mode.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Physical CBUS line number behind logical pin `index`.
    pub fn line(&self, index: usize) -> Result<u8> {
        self.lines[..self.len]
            .get(index)
            .copied()
            .ok_or(Error::InvalidPin {
                index,
                count: self.len,
            })
    }

    /// One-hot CBUS bit mask for logical pin `index`.
    pub fn physical_bit(&self, index: usize) -> Result<u8> {
        self.line(index).map(|line| 1 << line)
    }

    /// Iterate over `(logical index, physical bit)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, u8)> + '_ {
        self.lines[..self.len]
            .iter()
            .enumerate()
            .map(|(index, &line)| (index, 1 << line))
    }

    /// Union of the physical bits of all pins.
    pub fn mask(&self) -> u8 {
        self.iter().fold(0, |acc, (_, bit)| acc | bit)
    }
}

/// Parse the EEPROM's CBUS function table into a [`PinMap`].
///
/// Every line configured as IO mode gets the next logical index. The result
/// may be empty; that is a successful parse of a device with no GPIO.
pub fn discover_pins(image: &EepromImage) -> PinMap {
    let mut map = PinMap::default();
    for line in 0..CBUS_LINE_COUNT {
        let function = image.cbus_function(line);
        if function.is_io() {
            log::info!("GPIO {} is CBUS{}", map.count(), line);
            map.push(line as u8);
        } else {
            log::debug!("CBUS{} is {:?}, skipped", line, function);
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{CBUS_FUNCTION_OFFSET, FTDI_MAX_EEPROM_SIZE};

    fn image_with_table(table: [u8; 3]) -> EepromImage {
        let mut buf = [0u8; FTDI_MAX_EEPROM_SIZE];
        buf[CBUS_FUNCTION_OFFSET..CBUS_FUNCTION_OFFSET + 3].copy_from_slice(&table);
        EepromImage::from_bytes(&buf)
    }

    #[test]
    fn sparse_lines_get_dense_indices() {
        let map = discover_pins(&image_with_table([0x0A, 0x1A, 0x0A]));
        let pins: Vec<(usize, u8)> = map.iter().collect();
        assert_eq!(pins, vec![(0, 0x01), (1, 0x04), (2, 0x10)]);
        assert_eq!(map.line(1).unwrap(), 2);
        assert_eq!(map.mask(), 0x15);
    }

    #[test]
    fn all_lines_io() {
        let map = discover_pins(&image_with_table([0xAA, 0xAA, 0x0A]));
        assert_eq!(map.count(), 5);
        for i in 0..5 {
            assert_eq!(map.physical_bit(i).unwrap(), 1 << i);
        }
    }

    #[test]
    fn high_nibble_of_last_byte_is_ignored() {
        // 0x16 high nibble would be a sixth line; FT232R has five.
        let map = discover_pins(&image_with_table([0x00, 0x00, 0xA0]));
        assert!(map.is_empty());
    }

    #[test]
    fn no_io_lines() {
        let map = discover_pins(&image_with_table([0x32, 0x65, 0x01]));
        assert!(map.is_empty());
        assert_eq!(map.count(), 0);
        assert!(matches!(
            map.physical_bit(0),
            Err(Error::InvalidPin { index: 0, count: 0 })
        ));
    }

    #[test]
    fn out_of_range_index() {
        let map = PinMap::from_lines(&[1, 3]);
        assert!(matches!(
            map.physical_bit(2),
            Err(Error::InvalidPin { index: 2, count: 2 })
        ));
    }

    #[test]
    #[should_panic(expected = "strictly ascending")]
    fn from_lines_rejects_unordered() {
        PinMap::from_lines(&[3, 1]);
    }

    #[test]
    #[should_panic(expected = "CBUS line must be 0-4")]
    fn from_lines_rejects_line_5() {
        PinMap::from_lines(&[5]);
    }
}
