//! `embedded-hal` 1.0 digital pin implementations.
//!
//! This module lets CBUS pins drive any `embedded-hal` driver that takes a
//! GPIO (chip selects, resets, LEDs). Enable the `embedded-hal` feature in
//! your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! ftdi-cbus = { version = "0.1", features = ["embedded-hal"] }
//! ```
//!
//! # Provided implementations
//!
//! | Trait | Type | Notes |
//! |-------|------|-------|
//! | `embedded_hal::digital::InputPin` | [`CbusPin`] | Samples the live level |
//! | `embedded_hal::digital::OutputPin` | [`CbusPin`] | Sets the level; call [`CbusPin::set_output`] first |
//! | `embedded_hal::digital::StatefulOutputPin` | [`CbusPin`] | Answers from the register, no transfer |
//!
//! # Example
//!
//! ```no_run
//! use embedded_hal::digital::OutputPin;
//! use ftdi_cbus::{CbusGpio, DeviceFilter};
//!
//! let gpio = CbusGpio::open(&DeviceFilter::default())?;
//! let mut led = gpio.pin(0)?;
//! led.set_output(false)?;
//! led.set_high()?;
//! # Ok::<(), ftdi_cbus::Error>(())
//! ```

use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin, StatefulOutputPin};

use crate::error::Error;
use crate::gpio::CbusPin;
use crate::transport::Transport;

impl digital::Error for Error {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl<T: Transport> ErrorType for CbusPin<'_, T> {
    type Error = Error;
}

impl<T: Transport> InputPin for CbusPin<'_, T> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.read()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.read().map(|high| !high)
    }
}

impl<T: Transport> OutputPin for CbusPin<'_, T> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

impl<T: Transport> StatefulOutputPin for CbusPin<'_, T> {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        self.driven_level()
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        self.driven_level().map(|high| !high)
    }
}
