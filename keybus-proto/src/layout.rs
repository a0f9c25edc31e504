//! Partitioning of the id space between channel kinds.
//!
//! Every peripheral uses the same layout so the aggregator can keep a
//! single 16-entry key map per device:
//!
//! | Ids    | Channel                         |
//! |--------|---------------------------------|
//! | 0-7    | Buttons 0-7                     |
//! | 8-11   | Encoder 0 rotation values 0-3   |
//! | 12-15  | Encoder 1 rotation values 0-3   |
//!
//! Encoder rotation values come from the decoder's value tables
//! (clockwise / counter-clockwise, two tables selected by mode).

/// First id used by buttons.
pub const BUTTON_OFFSET: u8 = 0;

/// Number of button ids reserved per device.
pub const MAX_BUTTONS: usize = 8;

/// Number of ids reserved for each encoder.
pub const ENCODER_SLOT_WIDTH: u8 = 4;

/// Number of encoders a device may carry.
pub const MAX_ENCODERS: usize = 2;

/// First id of each encoder's slot.
pub const ENCODER_OFFSETS: [u8; MAX_ENCODERS] = [8, 12];

const _: () = {
    assert!(BUTTON_OFFSET as usize + MAX_BUTTONS <= ENCODER_OFFSETS[0] as usize);
    assert!(ENCODER_OFFSETS[0] + ENCODER_SLOT_WIDTH <= ENCODER_OFFSETS[1]);
    assert!(ENCODER_OFFSETS[1] + ENCODER_SLOT_WIDTH <= crate::event::MAX_ID + 1);
};

/// One physical input source on a peripheral.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// A push-button, by index.
    Button { index: u8 },
    /// Rotation of an encoder.
    EncoderRotation { encoder: u8 },
    /// The push switch on an encoder shaft. Never appears on the wire.
    EncoderModeSwitch { encoder: u8 },
}

impl Channel {
    /// Classify a wire id.
    ///
    /// Returns the channel and, for encoder rotation, the decoded value.
    #[must_use]
    pub fn of_id(id: u8) -> Option<(Channel, u8)> {
        if let Some(index) = id.checked_sub(BUTTON_OFFSET) {
            if (index as usize) < MAX_BUTTONS {
                return Some((Channel::Button { index }, 0));
            }
        }
        ENCODER_OFFSETS
            .iter()
            .enumerate()
            .find(|(_, &offset)| id >= offset && id - offset < ENCODER_SLOT_WIDTH)
            .map(|(encoder, &offset)| {
                (
                    Channel::EncoderRotation {
                        encoder: encoder as u8,
                    },
                    id - offset,
                )
            })
    }
}

/// Wire id of button `index`.
#[inline]
#[must_use]
pub const fn button_id(index: usize) -> Option<u8> {
    if index >= MAX_BUTTONS {
        return None;
    }
    Some(BUTTON_OFFSET + index as u8)
}

/// Wire id of rotation `value` on `encoder`.
#[inline]
#[must_use]
pub const fn encoder_id(encoder: usize, value: u8) -> Option<u8> {
    if encoder >= MAX_ENCODERS || value >= ENCODER_SLOT_WIDTH {
        return None;
    }
    Some(ENCODER_OFFSETS[encoder] + value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_ids() {
        assert_eq!(button_id(0), Some(0));
        assert_eq!(button_id(4), Some(4));
        assert_eq!(button_id(MAX_BUTTONS), None);
    }

    #[test]
    fn test_encoder_ids() {
        assert_eq!(encoder_id(0, 0), Some(8));
        assert_eq!(encoder_id(0, 3), Some(11));
        assert_eq!(encoder_id(1, 1), Some(13));
        assert_eq!(encoder_id(1, 4), None);
        assert_eq!(encoder_id(2, 0), None);
    }

    #[test]
    fn test_ranges_are_disjoint() {
        let mut seen = [false; 64];
        for index in 0..MAX_BUTTONS {
            let id = button_id(index).unwrap() as usize;
            assert!(!seen[id]);
            seen[id] = true;
        }
        for encoder in 0..MAX_ENCODERS {
            for value in 0..ENCODER_SLOT_WIDTH {
                let id = encoder_id(encoder, value).unwrap() as usize;
                assert!(!seen[id], "id {} assigned twice", id);
                seen[id] = true;
            }
        }
    }

    #[test]
    fn test_of_id_classifies() {
        assert_eq!(Channel::of_id(2), Some((Channel::Button { index: 2 }, 0)));
        assert_eq!(
            Channel::of_id(10),
            Some((Channel::EncoderRotation { encoder: 0 }, 2))
        );
        assert_eq!(
            Channel::of_id(13),
            Some((Channel::EncoderRotation { encoder: 1 }, 1))
        );
        assert_eq!(Channel::of_id(16), None);
        assert_eq!(Channel::of_id(63), None);
    }
}
