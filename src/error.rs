//! Error types for the ftdi-cbus crate.

/// The error type for CBUS GPIO operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error from the nusb USB layer while opening or claiming a device.
    #[error("USB error: {0}")]
    Usb(#[from] nusb::Error),

    /// A control transfer to the chip failed.
    #[error("USB transfer error: {0}")]
    Transfer(#[from] nusb::transfer::TransferError),

    /// A control transfer did not complete within the transport timeout.
    #[error("USB transfer timed out")]
    Timeout,

    /// An IN transfer returned fewer bytes than requested.
    #[error("short transfer: expected {expected} bytes, got {actual}")]
    ShortTransfer {
        /// Number of bytes requested.
        expected: usize,
        /// Number of bytes actually returned.
        actual: usize,
    },

    /// Reading the EEPROM image failed at the given word index.
    #[error("EEPROM read failed at word {word:#04x}")]
    EepromReadFailed {
        /// Word index of the failing 2-byte read.
        word: u16,
        /// Underlying transfer failure.
        #[source]
        source: Box<Error>,
    },

    /// The EEPROM configures none of the CBUS lines in IO mode.
    #[error("no CBUS line is configured in IO mode; set the pins to IO mode in the EEPROM")]
    NoPinsAvailable,

    /// A logical pin index outside the discovered range.
    #[error("invalid pin {index}: device exposes {count} pin(s)")]
    InvalidPin {
        /// The rejected logical index.
        index: usize,
        /// Number of usable pins on the device.
        count: usize,
    },

    /// The pin maps to a CBUS line that the bitmode register cannot drive.
    #[error("CBUS{line} cannot be driven through the CBUS bitmode register")]
    LineNotWritable {
        /// Physical CBUS line number.
        line: u8,
    },

    /// No matching device was found.
    #[error("device not found")]
    DeviceNotFound,

    /// The opened device is not an FT232R.
    #[error("unsupported chip (bcdDevice {bcd_device:#06x}); only FT232R is supported")]
    UnsupportedChip {
        /// The device's reported bcdDevice.
        bcd_device: u16,
    },
}

impl Error {
    /// Whether this error came from a failed transfer after the session was
    /// set up, as opposed to a caller mistake or an initialization failure.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Transfer(_) | Error::Timeout | Error::ShortTransfer { .. }
        )
    }
}

/// A specialized `Result` type for CBUS GPIO operations.
pub type Result<T> = std::result::Result<T, Error>;
