//! Command events: a direction plus a channel id.

/// Highest id that fits the 6-bit id field.
pub const MAX_ID: u8 = 0x3F;

/// Whether a channel became active or inactive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Press,
    Release,
}

/// Error returned when building an event from an out-of-range id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// The id does not fit in 6 bits.
    IdOutOfRange(u8),
}

/// A single input event as carried on the bus.
///
/// The id is always within `0..=MAX_ID`; constructors reject anything
/// larger so every `CommandEvent` has a valid wire encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandEvent {
    direction: Direction,
    id: u8,
}

impl CommandEvent {
    /// Create an event, validating the id range.
    #[inline]
    pub const fn new(direction: Direction, id: u8) -> Result<Self, EncodeError> {
        if id > MAX_ID {
            return Err(EncodeError::IdOutOfRange(id));
        }
        Ok(Self { direction, id })
    }

    /// Shorthand for a press event.
    #[inline]
    pub const fn press(id: u8) -> Result<Self, EncodeError> {
        Self::new(Direction::Press, id)
    }

    /// Shorthand for a release event.
    #[inline]
    pub const fn release(id: u8) -> Result<Self, EncodeError> {
        Self::new(Direction::Release, id)
    }

    #[inline]
    #[must_use]
    pub const fn direction(self) -> Direction {
        self.direction
    }

    #[inline]
    #[must_use]
    pub const fn id(self) -> u8 {
        self.id
    }

    #[inline]
    #[must_use]
    pub const fn is_press(self) -> bool {
        matches!(self.direction, Direction::Press)
    }
}
