//! The packed CBUS bitmode register.
//!
//! The FT232R takes the whole CBUS configuration in one byte: the high
//! nibble is the direction of CBUS0-3 (1 = output) and the low nibble is
//! the level driven on each output. The chip never reports the direction
//! back, so [`CbusState`] is the only record of it and every change has to
//! be sent in full.

use crate::constants::BITMODE_CBUS;

/// Mask of the bits that fit a nibble; CBUS4 has no slot in the register.
const NIBBLE: u8 = 0x0F;

/// Direction and level of a single pin, as recorded in the register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinState {
    /// Released; the line is read, not driven.
    Input,
    /// Driven low.
    OutputLow,
    /// Driven high.
    OutputHigh,
}

/// The CBUS bitmode register byte.
///
/// All methods take a one-hot physical bit for CBUS0-3 (0x01..=0x08).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CbusState(u8);

impl CbusState {
    /// Register with every line an input and every level low.
    pub const fn new() -> Self {
        Self(0)
    }

    /// Wrap a raw register byte.
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// The raw register byte.
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Direction nibble (1 = output).
    pub const fn directions(self) -> u8 {
        self.0 >> 4
    }

    /// Level nibble (1 = high).
    pub const fn levels(self) -> u8 {
        self.0 & NIBBLE
    }

    /// Whether `bit` can be represented in the register.
    #[inline]
    pub const fn fits(bit: u8) -> bool {
        bit != 0 && bit & !NIBBLE == 0
    }

    /// wValue of the set-bitmode request carrying this register.
    pub const fn bitmode_value(self) -> u16 {
        ((BITMODE_CBUS as u16) << 8) | self.0 as u16
    }

    /// Set or clear the level bit for `bit`.
    pub fn set_level(&mut self, bit: u8, high: bool) {
        debug_assert!(Self::fits(bit));
        if high {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }

    /// Mark `bit` as an output.
    pub fn set_output(&mut self, bit: u8) {
        debug_assert!(Self::fits(bit));
        self.0 |= bit << 4;
    }

    /// Mark `bit` as an input and clear its level bit.
    pub fn set_input(&mut self, bit: u8) {
        debug_assert!(Self::fits(bit));
        self.0 &= !((bit << 4) | bit);
    }

    /// Whether `bit` is marked as an output.
    ///
    /// Lines without a register slot (CBUS4) are never outputs.
    pub fn is_output(self, bit: u8) -> bool {
        Self::fits(bit) && self.0 & (bit << 4) != 0
    }

    /// Whether the level bit for `bit` is set.
    ///
    /// Always `false` for lines without a register slot; bit 0x10 of the
    /// register is CBUS0's direction, not CBUS4's level.
    pub fn level(self, bit: u8) -> bool {
        Self::fits(bit) && self.0 & bit != 0
    }

    /// Combined direction and level of `bit`.
    pub fn pin_state(self, bit: u8) -> PinState {
        match (self.is_output(bit), self.level(bit)) {
            (false, _) => PinState::Input,
            (true, false) => PinState::OutputLow,
            (true, true) => PinState::OutputHigh,
        }
    }
}
