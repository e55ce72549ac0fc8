//! The control-transfer boundary between the CBUS logic and the USB stack.
//!
//! Everything this crate sends to the chip is a vendor request addressed to
//! the device (`bmRequestType` 0xC0 for IN, 0x40 for OUT). [`Transport`]
//! captures exactly that, so the EEPROM reader and the GPIO register can be
//! driven by [`UsbTransport`](crate::usb::UsbTransport) in production and by
//! a scripted fake in tests.

use crate::error::Result;

/// Sends vendor control transfers to an FTDI chip.
///
/// Implementations block until the transfer completes or their timeout
/// expires. A timeout must be reported as [`Error::Timeout`](crate::Error::Timeout).
pub trait Transport {
    /// Issue a vendor IN request and return the data phase.
    ///
    /// The returned buffer may be shorter than `length`; callers check.
    fn control_in(&mut self, request: u8, value: u16, index: u16, length: u16) -> Result<Vec<u8>>;

    /// Issue a vendor OUT request with no data phase.
    fn control_out(&mut self, request: u8, value: u16, index: u16) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn control_in(&mut self, request: u8, value: u16, index: u16, length: u16) -> Result<Vec<u8>> {
        (**self).control_in(request, value, index, length)
    }

    fn control_out(&mut self, request: u8, value: u16, index: u16) -> Result<()> {
        (**self).control_out(request, value, index)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn control_in(&mut self, request: u8, value: u16, index: u16, length: u16) -> Result<Vec<u8>> {
        (**self).control_in(request, value, index, length)
    }

    fn control_out(&mut self, request: u8, value: u16, index: u16) -> Result<()> {
        (**self).control_out(request, value, index)
    }
}
