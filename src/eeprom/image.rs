//! The raw EEPROM image and the FT232R fields read from it.

use std::fmt;

use crate::constants::*;

/// A complete 256-byte EEPROM image as read from the chip.
///
/// The image is immutable once constructed. Only
/// [`read_eeprom`](super::read_eeprom) and [`from_bytes`](Self::from_bytes)
/// produce one, so a value of this type is always full-sized.
#[derive(Clone, PartialEq, Eq)]
pub struct EepromImage {
    buf: [u8; FTDI_MAX_EEPROM_SIZE],
}

impl EepromImage {
    /// Build an image from a dump.
    ///
    /// Shorter input is zero-padded; bytes past
    /// [`FTDI_MAX_EEPROM_SIZE`] are ignored.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut buf = [0u8; FTDI_MAX_EEPROM_SIZE];
        let len = data.len().min(FTDI_MAX_EEPROM_SIZE);
        buf[..len].copy_from_slice(&data[..len]);
        Self { buf }
    }

    pub(crate) fn from_array(buf: [u8; FTDI_MAX_EEPROM_SIZE]) -> Self {
        Self { buf }
    }

    /// Get the raw EEPROM buffer.
    pub fn as_bytes(&self) -> &[u8; FTDI_MAX_EEPROM_SIZE] {
        &self.buf
    }

    /// The 4-bit function code configured for CBUS line `line`.
    ///
    /// Lines are nibble-packed from offset 0x14: even lines in the low
    /// nibble, odd lines in the high nibble.
    ///
    /// # Panics
    ///
    /// Panics if `line >= 5`.
    pub fn cbus_mode(&self, line: usize) -> u8 {
        assert!(
            line < CBUS_LINE_COUNT,
            "CBUS line must be 0-4, got {}",
            line
        );
        let byte = self.buf[CBUS_FUNCTION_OFFSET + line / 2];
        if line % 2 == 0 {
            byte & 0x0F
        } else {
            (byte >> 4) & 0x0F
        }
    }

    /// The decoded function of CBUS line `line`.
    ///
    /// # Panics
    ///
    /// Panics if `line >= 5`.
    pub fn cbus_function(&self, line: usize) -> CbusFunction {
        CbusFunction::from_code(self.cbus_mode(line))
    }

    /// Checksum stored in the last word of the FT232R's 128-byte area.
    pub fn stored_checksum(&self) -> u16 {
        let at = FT232R_EEPROM_SIZE - 2;
        (self.buf[at] as u16) | ((self.buf[at + 1] as u16) << 8)
    }

    /// Checksum computed over the FT232R's 128-byte area.
    pub fn computed_checksum(&self) -> u16 {
        checksum(&self.buf, FT232R_EEPROM_SIZE)
    }

    /// Whether the stored checksum matches the contents.
    ///
    /// A chip with a bad checksum boots with factory defaults, so the CBUS
    /// table may not reflect what the hardware is actually doing.
    pub fn checksum_valid(&self) -> bool {
        self.stored_checksum() == self.computed_checksum()
    }
}

impl fmt::Debug for EepromImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = &self.buf[CBUS_FUNCTION_OFFSET..CBUS_FUNCTION_OFFSET + 3];
        f.debug_struct("EepromImage")
            .field("cbus_table", &format_args!("{:02X?}", table))
            .field("checksum_valid", &self.checksum_valid())
            .finish_non_exhaustive()
    }
}

/// Compute the EEPROM checksum over the first `size` bytes.
///
/// The algorithm is: XOR each 16-bit word, then rotate-left-1 the accumulator.
/// Starting seed is 0xAAAA. The last word (the checksum itself) is excluded.
pub(crate) fn checksum(buf: &[u8], size: usize) -> u16 {
    let mut csum: u16 = 0xAAAA;
    for i in 0..size / 2 - 1 {
        let value = (buf[i * 2] as u16) | ((buf[i * 2 + 1] as u16) << 8);
        csum ^= value;
        csum = csum.rotate_left(1);
    }
    csum
}

/// Function assigned to a CBUS line on FT232R.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CbusFunction {
    /// TX Data Enable.
    TxDen,
    /// Power Enable.
    PwrEn,
    /// RX LED (active low).
    RxLed,
    /// TX LED (active low).
    TxLed,
    /// TX/RX LED (active low).
    TxRxLed,
    /// Sleep.
    Sleep,
    /// 48 MHz clock output.
    Clk48,
    /// 24 MHz clock output.
    Clk24,
    /// 12 MHz clock output.
    Clk12,
    /// 6 MHz clock output.
    Clk6,
    /// General-purpose IO, driven through CBUS bit-bang.
    IoMode,
    /// Bitbang write strobe.
    BitbangWr,
    /// Bitbang read strobe.
    BitbangRd,
    /// A code the FT232R does not define.
    Unknown(u8),
}

impl CbusFunction {
    /// Decode a 4-bit function code.
    pub fn from_code(code: u8) -> Self {
        match code {
            cbus::TXDEN => Self::TxDen,
            cbus::PWREN => Self::PwrEn,
            cbus::RXLED => Self::RxLed,
            cbus::TXLED => Self::TxLed,
            cbus::TXRXLED => Self::TxRxLed,
            cbus::SLEEP => Self::Sleep,
            cbus::CLK48 => Self::Clk48,
            cbus::CLK24 => Self::Clk24,
            cbus::CLK12 => Self::Clk12,
            cbus::CLK6 => Self::Clk6,
            cbus::IOMODE => Self::IoMode,
            cbus::BB_WR => Self::BitbangWr,
            cbus::BB_RD => Self::BitbangRd,
            other => Self::Unknown(other),
        }
    }

    /// Whether the line is usable as a GPIO pin.
    #[inline]
    pub fn is_io(self) -> bool {
        self == Self::IoMode
    }
}
