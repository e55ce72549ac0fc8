//! Protocol constants for FT232R CBUS communication.
//!
//! These constants define the USB vendor request codes and EEPROM layout
//! details used to drive the CBUS lines. Most users should not need them
//! directly.

use std::time::Duration;

// ---- FTDI Vendor ID and Product ID ----

/// Default FTDI vendor ID.
pub const FTDI_VID: u16 = 0x0403;

/// Known FTDI product IDs.
pub mod pid {
    /// FT232AM, FT232BM, FT232R.
    pub const FT232: u16 = 0x6001;
}

/// bcdDevice reported by FT232R / FT245R.
pub const FT232R_BCD_DEVICE: u16 = 0x0600;

// ---- SIO vendor request codes ----

/// Set bitbang mode.
pub(crate) const SIO_SET_BITMODE_REQUEST: u8 = 0x0B;
/// Read pin states directly.
pub(crate) const SIO_READ_PINS_REQUEST: u8 = 0x0C;
/// Read EEPROM.
pub(crate) const SIO_READ_EEPROM_REQUEST: u8 = 0x90;

/// Bitmode selector for CBUS bit-bang, placed in the high byte of wValue.
pub const BITMODE_CBUS: u8 = 0x20;

/// Default control transfer timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

// ---- EEPROM layout ----

/// EEPROM size in bytes (256 for 93xx66).
pub const FTDI_MAX_EEPROM_SIZE: usize = 256;
/// Bytes covered by the FT232R checksum (internal EEPROM).
pub const FT232R_EEPROM_SIZE: usize = 0x80;
/// Offset of the nibble-packed CBUS function table on FT232R.
pub const CBUS_FUNCTION_OFFSET: usize = 0x14;
/// Number of CBUS lines on FT232R.
pub const CBUS_LINE_COUNT: usize = 5;

// ---- CBUS pin function codes ----

/// CBUS pin function codes for FT232R.
pub mod cbus {
    /// TX Data Enable.
    pub const TXDEN: u8 = 0;
    /// Power Enable.
    pub const PWREN: u8 = 1;
    /// RX LED (active low).
    pub const RXLED: u8 = 2;
    /// TX LED (active low).
    pub const TXLED: u8 = 3;
    /// TX/RX LED (active low).
    pub const TXRXLED: u8 = 4;
    /// Sleep.
    pub const SLEEP: u8 = 5;
    /// 48 MHz clock output.
    pub const CLK48: u8 = 6;
    /// 24 MHz clock output.
    pub const CLK24: u8 = 7;
    /// 12 MHz clock output.
    pub const CLK12: u8 = 8;
    /// 6 MHz clock output.
    pub const CLK6: u8 = 9;
    /// IO mode for CBUS bitbang.
    pub const IOMODE: u8 = 0x0A;
    /// Bitbang write.
    pub const BB_WR: u8 = 0x0B;
    /// Bitbang read.
    pub const BB_RD: u8 = 0x0C;
}
