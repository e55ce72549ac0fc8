//! GPIO access to the CBUS lines of an attached FT232R.
//!
//! [`CbusGpio`] is one device session: it reads the EEPROM once at
//! [`attach`](CbusGpio::attach), keeps the discovered [`PinMap`], and owns
//! the [`CbusState`] register. Every direction or level change rewrites the
//! whole register with a single set-bitmode transfer.
//!
//! # Example
//!
//! ```no_run
//! use ftdi_cbus::{CbusGpio, DeviceFilter};
//!
//! let gpio = CbusGpio::open(&DeviceFilter::default())?;
//! println!("{} CBUS pin(s) in IO mode", gpio.pin_count());
//!
//! // Drive the first IO line high
//! gpio.set_direction_output(0, true)?;
//!
//! // Release it and read it back
//! gpio.set_direction_input(0)?;
//! let level = gpio.read_pin(0)?;
//! # Ok::<(), ftdi_cbus::Error>(())
//! ```

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::cbus::{discover_pins, PinMap};
use crate::constants::*;
use crate::eeprom::read_eeprom;
use crate::error::{Error, Result};
use crate::state::{CbusState, PinState};
use crate::transport::Transport;

/// Transport and register, changed together under the session lock.
struct Shared<T> {
    transport: T,
    state: CbusState,
}

/// An attached FT232R exposing its IO-mode CBUS lines as GPIO pins.
///
/// Pins are addressed by logical index `0..pin_count()`. All operations
/// take `&self`; a per-device lock serializes them so that concurrent
/// updates to different pins cannot interleave inside the shared register.
pub struct CbusGpio<T: Transport> {
    shared: Mutex<Shared<T>>,
    pins: PinMap,
    interface: u16,
}

impl<T: Transport> fmt::Debug for CbusGpio<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CbusGpio")
            .field("pins", &self.pins)
            .field("interface", &self.interface)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ---- Session lifecycle ----

impl<T: Transport> CbusGpio<T> {
    /// Attach to a device: read its EEPROM and discover the IO-mode lines.
    ///
    /// `interface` is the wIndex used for pin reads and register writes
    /// (0 on FT232R). No transfer other than the EEPROM read is sent; every
    /// pin starts as an input in the register.
    ///
    /// Fails with [`Error::EepromReadFailed`] if the image cannot be read and
    /// with [`Error::NoPinsAvailable`] if no line is in IO mode. The
    /// transport is dropped on failure.
    pub fn attach(mut transport: T, interface: u16) -> Result<Self> {
        let image = read_eeprom(&mut transport)?;
        if !image.checksum_valid() {
            log::warn!(
                "EEPROM checksum mismatch (stored {:#06x}, computed {:#06x})",
                image.stored_checksum(),
                image.computed_checksum()
            );
        }

        let pins = discover_pins(&image);
        if pins.is_empty() {
            log::info!("no GPIO pins found; set the CBUS pins to IO mode in the EEPROM");
            return Err(Error::NoPinsAvailable);
        }
        if let Some((index, _)) = pins.iter().find(|&(_, bit)| !CbusState::fits(bit)) {
            log::warn!("GPIO {index} is CBUS4, which CBUS bit-bang cannot drive; it is read-only");
        }

        Ok(Self {
            shared: Mutex::new(Shared {
                transport,
                state: CbusState::new(),
            }),
            pins,
            interface,
        })
    }

    /// End the session.
    ///
    /// The register is discarded as-is; the lines keep whatever was last
    /// written. Returns the transport so the caller can reuse or close it.
    pub fn detach(self) -> T {
        log::info!("device detached");
        self.shared
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .transport
    }

    /// Number of usable pins.
    pub fn pin_count(&self) -> usize {
        self.pins.count()
    }

    /// The logical-to-physical pin table.
    pub fn pin_map(&self) -> &PinMap {
        &self.pins
    }

    /// The interface index used as wIndex.
    pub fn interface(&self) -> u16 {
        self.interface
    }

    /// Snapshot of the register as last written (or about to be written).
    pub fn state(&self) -> CbusState {
        self.lock().state
    }

    /// Direction and level of pin `index` according to the register.
    pub fn pin_state(&self, index: usize) -> Result<PinState> {
        let bit = self.pins.physical_bit(index)?;
        Ok(self.state().pin_state(bit))
    }

    /// A handle to pin `index`.
    pub fn pin(&self, index: usize) -> Result<CbusPin<'_, T>> {
        self.pins.physical_bit(index)?;
        Ok(CbusPin { gpio: self, index })
    }

    /// Handles to every pin, in logical order.
    pub fn pins(&self) -> impl Iterator<Item = CbusPin<'_, T>> + '_ {
        (0..self.pins.count()).map(move |index| CbusPin { gpio: self, index })
    }

    fn lock(&self) -> MutexGuard<'_, Shared<T>> {
        // The register is a plain byte; a panic elsewhere cannot leave it torn.
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Physical bit of a pin that is about to be written.
    fn writable_bit(&self, index: usize) -> Result<u8> {
        let bit = self.pins.physical_bit(index)?;
        if !CbusState::fits(bit) {
            return Err(Error::LineNotWritable {
                line: bit.trailing_zeros() as u8,
            });
        }
        Ok(bit)
    }
}

// ---- Pin operations ----

impl<T: Transport> CbusGpio<T> {
    /// Read the live level of pin `index`.
    ///
    /// This samples the hardware regardless of the pin's direction. A
    /// failed transfer is returned as an error, never as a default level.
    pub fn read_pin(&self, index: usize) -> Result<bool> {
        let bit = self.pins.physical_bit(index)?;
        let mut shared = self.lock();
        let data = shared
            .transport
            .control_in(SIO_READ_PINS_REQUEST, 0, self.interface, 1)?;
        let pins = *data.first().ok_or(Error::ShortTransfer {
            expected: 1,
            actual: 0,
        })?;
        Ok(pins & bit != 0)
    }

    /// Set the level of pin `index` and write the register.
    ///
    /// The level is recorded even if the pin is an input; it takes effect
    /// once the pin is switched to output.
    pub fn set_pin(&self, index: usize, high: bool) -> Result<()> {
        let bit = self.writable_bit(index)?;
        let mut shared = self.lock();
        shared.state.set_level(bit, high);
        self.flush(&mut shared)
    }

    /// Release pin `index` to input.
    ///
    /// The level bit is left set: the FT232R pulls released CBUS lines high,
    /// and the register mirrors that. One transfer is sent.
    pub fn set_direction_input(&self, index: usize) -> Result<()> {
        let bit = self.writable_bit(index)?;
        let mut shared = self.lock();
        shared.state.set_input(bit);
        shared.state.set_level(bit, true);
        self.flush(&mut shared)
    }

    /// Make pin `index` an output driving `initial`. One transfer is sent.
    pub fn set_direction_output(&self, index: usize, initial: bool) -> Result<()> {
        let bit = self.writable_bit(index)?;
        let mut shared = self.lock();
        shared.state.set_output(bit);
        shared.state.set_level(bit, initial);
        self.flush(&mut shared)
    }

    /// Write the register to the chip.
    ///
    /// The in-memory register is not rolled back if the transfer fails, so
    /// it may be ahead of the hardware until the next successful write.
    fn flush(&self, shared: &mut Shared<T>) -> Result<()> {
        let value = shared.state.bitmode_value();
        log::debug!(
            "CBUS register {:#04x} (wValue {:#06x})",
            shared.state.raw(),
            value
        );
        shared
            .transport
            .control_out(SIO_SET_BITMODE_REQUEST, value, self.interface)
    }
}

/// A single CBUS GPIO pin, borrowed from its [`CbusGpio`].
///
/// This is the per-pin capability object handed to consumers. It is cheap
/// to copy, and all handles of a device share the device's lock.
pub struct CbusPin<'a, T: Transport> {
    gpio: &'a CbusGpio<T>,
    index: usize,
}

impl<T: Transport> Clone for CbusPin<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Transport> Copy for CbusPin<'_, T> {}

impl<T: Transport> fmt::Debug for CbusPin<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CbusPin")
            .field("index", &self.index)
            .field("line", &self.line())
            .finish()
    }
}

impl<T: Transport> CbusPin<'_, T> {
    /// Logical pin index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Physical CBUS line number.
    pub fn line(&self) -> u8 {
        self.mask().trailing_zeros() as u8
    }

    /// One-hot CBUS bit mask.
    pub fn mask(&self) -> u8 {
        // The index was validated when the handle was made.
        self.gpio.pins.physical_bit(self.index).unwrap_or(0)
    }

    /// Read the live level.
    pub fn read(&self) -> Result<bool> {
        self.gpio.read_pin(self.index)
    }

    /// Set the level.
    pub fn write(&self, high: bool) -> Result<()> {
        self.gpio.set_pin(self.index, high)
    }

    /// Configure as an output driving `initial`.
    pub fn set_output(&self, initial: bool) -> Result<()> {
        self.gpio.set_direction_output(self.index, initial)
    }

    /// Configure as an input.
    pub fn set_input(&self) -> Result<()> {
        self.gpio.set_direction_input(self.index)
    }

    /// Direction and level according to the register.
    pub fn state(&self) -> PinState {
        self.gpio.state().pin_state(self.mask())
    }

    /// Level bit in the register (what the pin drives when it is an output).
    ///
    /// `false` for a pin on CBUS4, which has no register slot.
    pub fn level(&self) -> bool {
        self.gpio.state().level(self.mask())
    }

    /// Level bit in the register, or [`Error::LineNotWritable`] for a pin
    /// the register cannot hold.
    pub fn driven_level(&self) -> Result<bool> {
        let bit = self.gpio.writable_bit(self.index)?;
        Ok(self.gpio.state().level(bit))
    }

    /// Check whether this pin is currently configured as an output.
    pub fn is_output(&self) -> bool {
        self.state() != PinState::Input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fake::{FakeTransport, Request};

    /// Lines 0, 2 and 4 in IO mode.
    fn attached() -> CbusGpio<FakeTransport> {
        CbusGpio::attach(FakeTransport::with_cbus_table([0x0A, 0x1A, 0x0A]), 0).unwrap()
    }

    fn outs(gpio: CbusGpio<FakeTransport>) -> Vec<(u8, u16, u16)> {
        gpio.detach().outs()
    }

    #[test]
    fn attach_reads_eeprom_only() {
        let gpio = attached();
        assert_eq!(gpio.pin_count(), 3);
        assert_eq!(gpio.state(), CbusState::new());
        let fake = gpio.detach();
        assert_eq!(fake.requests.len(), FTDI_MAX_EEPROM_SIZE / 2);
        assert!(fake.outs().is_empty());
    }

    #[test]
    fn attach_without_io_lines() {
        let err = CbusGpio::attach(FakeTransport::with_cbus_table([0x32, 0x10, 0x05]), 0)
            .unwrap_err();
        assert!(matches!(err, Error::NoPinsAvailable));
    }

    #[test]
    fn attach_eeprom_failure() {
        let mut fake = FakeTransport::with_cbus_table([0x0A, 0, 0]);
        fake.short_eeprom_at = Some(0x0A);
        let err = CbusGpio::attach(fake, 0).unwrap_err();
        assert!(matches!(err, Error::EepromReadFailed { word: 0x0A, .. }));
    }

    #[test]
    fn output_high_writes_0x2011() {
        let gpio = attached();
        gpio.set_direction_output(0, true).unwrap();
        assert_eq!(gpio.state().raw(), 0x11);
        assert_eq!(outs(gpio), vec![(0x0B, 0x2011, 0)]);
    }

    #[test]
    fn output_low_clears_level() {
        let gpio = attached();
        gpio.set_direction_output(1, true).unwrap();
        gpio.set_direction_output(1, false).unwrap();
        assert_eq!(gpio.state().raw(), 0x40);
        assert_eq!(gpio.pin_state(1).unwrap(), PinState::OutputLow);
    }

    #[test]
    fn set_pin_twice_is_idempotent() {
        let gpio = attached();
        gpio.set_pin(1, true).unwrap();
        let first = gpio.state();
        gpio.set_pin(1, true).unwrap();
        assert_eq!(gpio.state(), first);
        assert_eq!(outs(gpio), vec![(0x0B, 0x2004, 0), (0x0B, 0x2004, 0)]);
    }

    #[test]
    fn input_clears_direction_and_drives_level_high() {
        let gpio = attached();
        gpio.set_direction_output(1, false).unwrap();
        gpio.set_direction_input(1).unwrap();
        assert_eq!(gpio.state().raw(), 0x04);
        assert_eq!(gpio.pin_state(1).unwrap(), PinState::Input);
        assert_eq!(outs(gpio), vec![(0x0B, 0x2040, 0), (0x0B, 0x2004, 0)]);
    }

    #[test]
    fn pins_do_not_disturb_each_other() {
        let gpio = attached();
        gpio.set_direction_output(0, true).unwrap();
        gpio.set_direction_output(1, false).unwrap();
        gpio.set_pin(0, false).unwrap();
        assert_eq!(gpio.state().raw(), 0x50);
        assert_eq!(gpio.pin_state(0).unwrap(), PinState::OutputLow);
        assert_eq!(gpio.pin_state(1).unwrap(), PinState::OutputLow);
    }

    #[test]
    fn invalid_pin_sends_nothing() {
        let gpio = attached();
        assert!(matches!(gpio.read_pin(3), Err(Error::InvalidPin { index: 3, count: 3 })));
        assert!(matches!(gpio.set_pin(3, true), Err(Error::InvalidPin { .. })));
        assert!(matches!(gpio.set_direction_input(7), Err(Error::InvalidPin { .. })));
        assert!(matches!(
            gpio.set_direction_output(3, true),
            Err(Error::InvalidPin { .. })
        ));
        assert!(gpio.pin(3).is_err());
        let fake = gpio.detach();
        assert_eq!(fake.requests.len(), FTDI_MAX_EEPROM_SIZE / 2);
    }

    #[test]
    fn cbus4_is_read_only() {
        let gpio = attached();
        assert!(matches!(
            gpio.set_direction_output(2, true),
            Err(Error::LineNotWritable { line: 4 })
        ));
        assert!(matches!(gpio.set_pin(2, true), Err(Error::LineNotWritable { line: 4 })));
        assert!(matches!(
            gpio.set_direction_input(2),
            Err(Error::LineNotWritable { line: 4 })
        ));
        assert_eq!(gpio.state(), CbusState::new());
        assert!(outs(gpio).is_empty());
    }

    #[test]
    fn cbus4_ignores_cbus0_direction() {
        let gpio = attached();
        gpio.set_direction_output(0, false).unwrap();
        assert_eq!(gpio.state().raw(), 0x10);

        let cbus4 = gpio.pin(2).unwrap();
        assert!(!cbus4.level());
        assert!(!cbus4.is_output());
        assert_eq!(gpio.pin_state(2).unwrap(), PinState::Input);
        assert!(matches!(
            cbus4.driven_level(),
            Err(Error::LineNotWritable { line: 4 })
        ));
        assert!(!gpio.pin(0).unwrap().driven_level().unwrap());
    }

    #[test]
    fn read_pin_tests_physical_bit() {
        let mut fake = FakeTransport::with_cbus_table([0x0A, 0x1A, 0x0A]);
        fake.pins = 0x04;
        let gpio = CbusGpio::attach(fake, 0).unwrap();
        assert!(!gpio.read_pin(0).unwrap());
        assert!(gpio.read_pin(1).unwrap());
        assert!(!gpio.read_pin(2).unwrap());

        let fake = gpio.detach();
        assert_eq!(
            fake.requests.last(),
            Some(&Request::In {
                request: 0x0C,
                value: 0,
                index: 0,
                length: 1,
            })
        );
    }

    #[test]
    fn read_pin_surfaces_transport_failure() {
        let gpio = attached();
        gpio.lock()
            .transport
            .failures
            .push_back(Error::Transfer(nusb::transfer::TransferError::Stall));
        let err = gpio.read_pin(0).unwrap_err();
        assert!(err.is_transport());

        // The session is still usable afterwards.
        gpio.set_direction_output(0, true).unwrap();
    }

    #[test]
    fn failed_flush_keeps_register() {
        let gpio = attached();
        gpio.lock().transport.failures.push_back(Error::Timeout);
        assert!(matches!(gpio.set_direction_output(0, true), Err(Error::Timeout)));
        assert_eq!(gpio.state().raw(), 0x11);
    }

    #[test]
    fn interface_is_used_as_windex() {
        let gpio =
            CbusGpio::attach(FakeTransport::with_cbus_table([0x0A, 0, 0]), 3).unwrap();
        gpio.set_pin(0, true).unwrap();
        assert_eq!(outs(gpio), vec![(0x0B, 0x2001, 3)]);
    }

    #[test]
    fn pin_handles() {
        let gpio = attached();
        let lines: Vec<u8> = gpio.pins().map(|p| p.line()).collect();
        assert_eq!(lines, vec![0, 2, 4]);

        let pin = gpio.pin(1).unwrap();
        assert_eq!(pin.mask(), 0x04);
        assert!(!pin.is_output());
        pin.set_output(true).unwrap();
        assert!(pin.is_output());
        assert_eq!(pin.state(), PinState::OutputHigh);
        pin.write(false).unwrap();
        assert_eq!(pin.state(), PinState::OutputLow);
        pin.set_input().unwrap();
        assert_eq!(pin.state(), PinState::Input);
    }

    #[test]
    fn concurrent_updates_do_not_lose_bits() {
        let gpio = CbusGpio::attach(FakeTransport::with_cbus_table([0xAA, 0xAA, 0]), 0).unwrap();
        std::thread::scope(|s| {
            for index in 0..4 {
                let gpio = &gpio;
                s.spawn(move || {
                    for _ in 0..50 {
                        gpio.set_direction_output(index, true).unwrap();
                    }
                });
            }
        });
        assert_eq!(gpio.state().raw(), 0xFF);
        assert_eq!(outs(gpio).len(), 200);
    }
}
