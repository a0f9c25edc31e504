//! Boot-protocol keyboard report bookkeeping.
//!
//! The report is the standard 8-byte boot keyboard input report:
//!
//! ```text
//! byte 0     modifier bits (LeftCtrl = bit 0 .. RightGui = bit 7)
//! byte 1     reserved, always 0
//! byte 2..8  up to six held usage codes, unused slots 0
//! ```

use heapless::Vec;

use crate::emit::EmitError;
use crate::keymap::KeyCode;

/// Keys a boot report can hold at once, excluding modifiers.
pub const ROLLOVER: usize = 6;

/// Length of a serialized report.
pub const REPORT_LEN: usize = 8;

/// Current state of held keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyboardReport {
    modifiers: u8,
    keys: Vec<u8, ROLLOVER>,
}

impl KeyboardReport {
    /// A report with nothing held.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            modifiers: 0,
            keys: Vec::new(),
        }
    }

    /// Mark `key` as held.
    ///
    /// Returns `Ok(false)` if it was already held.
    pub fn press(&mut self, key: KeyCode) -> Result<bool, EmitError> {
        if let Some(bit) = key.modifier_bit() {
            let changed = self.modifiers & bit == 0;
            self.modifiers |= bit;
            return Ok(changed);
        }

        if self.keys.contains(&key.usage()) {
            return Ok(false);
        }
        self.keys
            .push(key.usage())
            .map_err(|_| EmitError::RolloverFull)?;
        Ok(true)
    }

    /// Mark `key` as no longer held.
    ///
    /// Returns `false` if it was not held.
    pub fn release(&mut self, key: KeyCode) -> bool {
        if let Some(bit) = key.modifier_bit() {
            let changed = self.modifiers & bit != 0;
            self.modifiers &= !bit;
            return changed;
        }

        match self.keys.iter().position(|&usage| usage == key.usage()) {
            Some(index) => {
                // Keep the remaining keys in press order
                self.keys.remove(index);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_held(&self, key: KeyCode) -> bool {
        match key.modifier_bit() {
            Some(bit) => self.modifiers & bit != 0,
            None => self.keys.contains(&key.usage()),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modifiers == 0 && self.keys.is_empty()
    }

    #[inline]
    #[must_use]
    pub const fn modifiers(&self) -> u8 {
        self.modifiers
    }

    /// Release everything.
    pub fn clear(&mut self) {
        self.modifiers = 0;
        self.keys.clear();
    }

    /// Serialize to the 8-byte wire report.
    #[must_use]
    pub fn as_bytes(&self) -> [u8; REPORT_LEN] {
        let mut bytes = [0u8; REPORT_LEN];
        bytes[0] = self.modifiers;
        bytes[2..2 + self.keys.len()].copy_from_slice(&self.keys);
        bytes
    }
}
