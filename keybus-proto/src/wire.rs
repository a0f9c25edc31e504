//! Byte encoding of [`CommandEvent`]s.

use crate::event::{CommandEvent, Direction, MAX_ID};

/// Byte a peripheral answers with when it has nothing queued.
pub const SENTINEL: u8 = 0xFF;

const RELEASE_FLAG: u8 = 0x80;
const RESERVED_BIT: u8 = 0x40;

/// Why a received byte did not yield an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// The sentinel: no pending event.
    Empty,
    /// Reserved bit set, not produced by any encoder.
    Malformed(u8),
}

/// Encode an event into its wire byte.
#[inline]
#[must_use]
pub const fn encode(event: CommandEvent) -> u8 {
    let flag = match event.direction() {
        Direction::Press => 0,
        Direction::Release => RELEASE_FLAG,
    };
    flag | (event.id() & MAX_ID)
}

/// Decode a wire byte back into an event.
///
/// The sentinel and any byte with the reserved bit set are rejected; the
/// aggregator treats both as "nothing pending".
#[inline]
pub fn decode(byte: u8) -> Result<CommandEvent, DecodeError> {
    if byte == SENTINEL {
        return Err(DecodeError::Empty);
    }
    if byte & RESERVED_BIT != 0 {
        return Err(DecodeError::Malformed(byte));
    }
    let direction = if byte & RELEASE_FLAG != 0 {
        Direction::Release
    } else {
        Direction::Press
    };
    CommandEvent::new(direction, byte & MAX_ID).map_err(|_| DecodeError::Malformed(byte))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_has_clear_high_bit() {
        let byte = encode(CommandEvent::press(5).unwrap());
        assert_eq!(byte, 0x05);
    }

    #[test]
    fn test_release_sets_high_bit() {
        let byte = encode(CommandEvent::release(12).unwrap());
        assert_eq!(byte, 0x8C);
    }

    #[test]
    fn test_round_trip_all_events() {
        for id in 0..=MAX_ID {
            for direction in [Direction::Press, Direction::Release] {
                let event = CommandEvent::new(direction, id).unwrap();
                assert_eq!(decode(encode(event)), Ok(event));
            }
        }
    }

    #[test]
    fn test_sentinel_is_never_encoded() {
        for id in 0..=MAX_ID {
            assert_ne!(encode(CommandEvent::press(id).unwrap()), SENTINEL);
            assert_ne!(encode(CommandEvent::release(id).unwrap()), SENTINEL);
        }
        assert_eq!(decode(SENTINEL), Err(DecodeError::Empty));
    }

    #[test]
    fn test_reserved_bit_is_malformed() {
        assert_eq!(decode(0x40), Err(DecodeError::Malformed(0x40)));
        assert_eq!(decode(0xC1), Err(DecodeError::Malformed(0xC1)));
    }

    #[test]
    fn test_decode_out_of_map_id() {
        // Release of id 16: well-formed on the wire, beyond any key map.
        let event = decode(0x90).unwrap();
        assert_eq!(event.direction(), Direction::Release);
        assert_eq!(event.id(), 16);
    }
}
