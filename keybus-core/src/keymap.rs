//! Aggregator-side mapping from channel ids to keys.

/// Size of every device's key map; ids at or above this are invalid.
pub const KEYMAP_SIZE: usize = 16;

/// A USB HID keyboard usage code (usage page 0x07).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct KeyCode(pub u8);

impl KeyCode {
    pub const A: Self = Self(0x04);
    pub const B: Self = Self(0x05);
    pub const C: Self = Self(0x06);
    pub const D: Self = Self(0x07);
    pub const E: Self = Self(0x08);
    pub const F: Self = Self(0x09);
    pub const G: Self = Self(0x0A);
    pub const H: Self = Self(0x0B);
    pub const I: Self = Self(0x0C);
    pub const J: Self = Self(0x0D);
    pub const K: Self = Self(0x0E);
    pub const L: Self = Self(0x0F);
    pub const M: Self = Self(0x10);
    pub const N: Self = Self(0x11);
    pub const O: Self = Self(0x12);
    pub const P: Self = Self(0x13);
    pub const Q: Self = Self(0x14);
    pub const R: Self = Self(0x15);
    pub const S: Self = Self(0x16);
    pub const T: Self = Self(0x17);
    pub const U: Self = Self(0x18);
    pub const V: Self = Self(0x19);
    pub const W: Self = Self(0x1A);
    pub const X: Self = Self(0x1B);
    pub const Y: Self = Self(0x1C);
    pub const Z: Self = Self(0x1D);

    pub const KEY_1: Self = Self(0x1E);
    pub const KEY_2: Self = Self(0x1F);
    pub const KEY_3: Self = Self(0x20);
    pub const KEY_4: Self = Self(0x21);
    pub const KEY_5: Self = Self(0x22);
    pub const KEY_6: Self = Self(0x23);
    pub const KEY_7: Self = Self(0x24);
    pub const KEY_8: Self = Self(0x25);
    pub const KEY_9: Self = Self(0x26);
    pub const KEY_0: Self = Self(0x27);

    pub const ENTER: Self = Self(0x28);
    pub const ESCAPE: Self = Self(0x29);
    pub const BACKSPACE: Self = Self(0x2A);
    pub const TAB: Self = Self(0x2B);
    pub const SPACE: Self = Self(0x2C);

    pub const F1: Self = Self(0x3A);
    pub const F2: Self = Self(0x3B);
    pub const F3: Self = Self(0x3C);
    pub const F4: Self = Self(0x3D);
    pub const F5: Self = Self(0x3E);
    pub const F6: Self = Self(0x3F);
    pub const F7: Self = Self(0x40);
    pub const F8: Self = Self(0x41);
    pub const F9: Self = Self(0x42);
    pub const F10: Self = Self(0x43);
    pub const F11: Self = Self(0x44);
    pub const F12: Self = Self(0x45);

    pub const HOME: Self = Self(0x4A);
    pub const PAGE_UP: Self = Self(0x4B);
    pub const DELETE: Self = Self(0x4C);
    pub const END: Self = Self(0x4D);
    pub const PAGE_DOWN: Self = Self(0x4E);
    pub const RIGHT: Self = Self(0x4F);
    pub const LEFT: Self = Self(0x50);
    pub const DOWN: Self = Self(0x51);
    pub const UP: Self = Self(0x52);

    pub const F13: Self = Self(0x68);
    pub const F14: Self = Self(0x69);
    pub const F15: Self = Self(0x6A);
    pub const F16: Self = Self(0x6B);
    pub const F17: Self = Self(0x6C);
    pub const F18: Self = Self(0x6D);
    pub const F19: Self = Self(0x6E);
    pub const F20: Self = Self(0x6F);
    pub const F21: Self = Self(0x70);
    pub const F22: Self = Self(0x71);
    pub const F23: Self = Self(0x72);
    pub const F24: Self = Self(0x73);

    // Keyboard-page volume usages. Linux hosts act on them; Windows and
    // macOS only honor volume on the consumer page.
    pub const MUTE: Self = Self(0x7F);
    pub const VOLUME_UP: Self = Self(0x80);
    pub const VOLUME_DOWN: Self = Self(0x81);

    pub const LEFT_CTRL: Self = Self(0xE0);
    pub const LEFT_SHIFT: Self = Self(0xE1);
    pub const LEFT_ALT: Self = Self(0xE2);
    pub const LEFT_GUI: Self = Self(0xE3);
    pub const RIGHT_CTRL: Self = Self(0xE4);
    pub const RIGHT_SHIFT: Self = Self(0xE5);
    pub const RIGHT_ALT: Self = Self(0xE6);
    pub const RIGHT_GUI: Self = Self(0xE7);
}

impl KeyCode {
    /// Raw usage code.
    #[inline]
    #[must_use]
    pub const fn usage(self) -> u8 {
        self.0
    }

    /// Whether this usage is one of the eight modifier keys.
    #[inline]
    #[must_use]
    pub const fn is_modifier(self) -> bool {
        self.0 >= Self::LEFT_CTRL.0 && self.0 <= Self::RIGHT_GUI.0
    }

    /// Bit in the report's modifier byte, for modifier keys.
    #[inline]
    #[must_use]
    pub const fn modifier_bit(self) -> Option<u8> {
        if self.is_modifier() {
            Some(1 << (self.0 - Self::LEFT_CTRL.0))
        } else {
            None
        }
    }
}

/// Fixed table from channel id to key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyMap([Option<KeyCode>; KEYMAP_SIZE]);

impl KeyMap {
    /// A map with no ids bound.
    pub const EMPTY: Self = Self([None; KEYMAP_SIZE]);

    #[must_use]
    pub const fn new(keys: [Option<KeyCode>; KEYMAP_SIZE]) -> Self {
        Self(keys)
    }

    /// Key bound to `id`, or `None` if the id is out of range or unbound.
    #[inline]
    #[must_use]
    pub fn lookup(&self, id: u8) -> Option<KeyCode> {
        self.0.get(usize::from(id)).copied().flatten()
    }

    /// Return a copy with `id` bound to `key`. Out-of-range ids are ignored.
    #[must_use]
    pub const fn with(mut self, id: u8, key: KeyCode) -> Self {
        if (id as usize) < KEYMAP_SIZE {
            self.0[id as usize] = Some(key);
        }
        self
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// A peripheral as seen from the aggregator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Device {
    /// 7-bit bus address.
    pub address: u8,
    pub keymap: KeyMap,
}

impl Device {
    #[must_use]
    pub const fn new(address: u8, keymap: KeyMap) -> Self {
        Self { address, keymap }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_bound_and_unbound() {
        let map = KeyMap::EMPTY.with(0, KeyCode::F13).with(15, KeyCode::PAGE_UP);
        assert_eq!(map.lookup(0), Some(KeyCode::F13));
        assert_eq!(map.lookup(15), Some(KeyCode::PAGE_UP));
        assert_eq!(map.lookup(7), None);
    }

    #[test]
    fn test_lookup_out_of_range() {
        let map = KeyMap::new([Some(KeyCode::A); KEYMAP_SIZE]);
        assert_eq!(map.lookup(16), None);
        assert_eq!(map.lookup(0x3F), None);
        assert_eq!(map.lookup(u8::MAX), None);
    }

    #[test]
    fn test_with_ignores_out_of_range() {
        assert_eq!(KeyMap::EMPTY.with(16, KeyCode::A), KeyMap::EMPTY);
    }

    #[test]
    fn test_modifier_bits() {
        assert_eq!(KeyCode::LEFT_CTRL.modifier_bit(), Some(0x01));
        assert_eq!(KeyCode::LEFT_SHIFT.modifier_bit(), Some(0x02));
        assert_eq!(KeyCode::RIGHT_GUI.modifier_bit(), Some(0x80));
        assert_eq!(KeyCode::A.modifier_bit(), None);
        assert!(!KeyCode::F24.is_modifier());
    }
}
