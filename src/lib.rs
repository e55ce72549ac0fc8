//! Pure Rust access to the CBUS GPIO lines of an FTDI FT232R.
//!
//! The FT232R has five CBUS lines whose function is set in its EEPROM. Lines
//! configured as IO mode can be driven and sampled from the host through
//! the chip's CBUS bit-bang mode. This crate reads the EEPROM to find those
//! lines, numbers them as dense GPIO pins, and keeps the packed
//! direction/level register the chip expects. It uses
//! [nusb](https://crates.io/crates/nusb) as the USB backend — no C
//! dependencies or `libusb` required.
//!
//! # Quick Start
//!
//! ```no_run
//! use ftdi_cbus::{CbusGpio, DeviceFilter};
//!
//! // Open the first FT232R connected
//! let gpio = CbusGpio::open(&DeviceFilter::default())?;
//! for pin in gpio.pins() {
//!     println!("GPIO {} is CBUS{}", pin.index(), pin.line());
//! }
//! gpio.set_direction_output(0, true)?;
//! # Ok::<(), ftdi_cbus::Error>(())
//! ```
//!
//! # Features
//!
//! - **Pin discovery**: Decode the EEPROM CBUS table ([`eeprom`], [`cbus`]).
//! - **GPIO**: Read levels, set levels and directions, one USB transfer per
//!   change ([`gpio`]).
//! - **Pluggable transport**: Everything above runs over the [`Transport`]
//!   trait; [`UsbTransport`] is the `nusb` implementation.
//! - **`embedded-hal`**: `InputPin` / `OutputPin` / `StatefulOutputPin` for
//!   [`CbusPin`] behind the `embedded-hal` feature.

pub mod cbus;
pub mod constants;
pub mod eeprom;
pub mod error;
pub mod gpio;
#[cfg(feature = "embedded-hal")]
pub mod hal;
pub mod state;
pub mod transport;
pub mod usb;

// ---- Convenience re-exports ----

pub use cbus::{discover_pins, PinMap};
pub use constants::FTDI_VID;
pub use eeprom::{read_eeprom, CbusFunction, EepromImage};
pub use error::{Error, Result};
pub use gpio::{CbusGpio, CbusPin};
pub use state::{CbusState, PinState};
pub use transport::Transport;
pub use usb::{find_device, find_devices, DeviceFilter, UsbTransport};
