//! FT232R EEPROM access: reading the image and decoding the CBUS table.
//!
//! The EEPROM stores, among device identification and USB descriptor
//! strings, the function assigned to each CBUS line. This module provides:
//!
//! - [`read_eeprom`] - Fetch the full image over a [`Transport`](crate::Transport).
//! - [`EepromImage`] - The immutable image, with CBUS table and checksum
//!   accessors.
//! - [`CbusFunction`] - The decoded function of a CBUS line.

mod image;
mod io;

pub use image::{CbusFunction, EepromImage};
pub use io::read_eeprom;
