//! Wire format for the keybus input protocol.
//!
//! Peripheral nodes turn button and rotary-encoder activity into
//! [`CommandEvent`]s and hand them to the aggregator one byte at a time
//! over a request/response bus. This crate defines that byte.
//!
//! - **Events**: [`Direction`] and [`CommandEvent`]
//! - **Layout**: how channel kinds share the 6-bit id space ([`Channel`],
//!   [`button_id`], [`encoder_id`])
//! - **Wire**: [`encode`], [`decode`] and the [`SENTINEL`] byte
//!
//! # Wire Format
//!
//! ```text
//!  bit  7    6    5..0
//!     +----+----+--------+
//!     | D  | 0  |   id   |
//!     +----+----+--------+
//! ```
//!
//! - `D` - direction, 0 = press, 1 = release
//! - bit 6 - always 0 in a valid event
//! - `id` - channel id, 0-63
//!
//! `0xFF` means "no pending event". Because bit 6 is set it can never be
//! produced by [`encode`].
//!
//! # Example
//!
//! ```
//! use keybus_proto::{decode, encode, CommandEvent, Direction, SENTINEL};
//!
//! let event = CommandEvent::release(3).unwrap();
//! let byte = encode(event);
//! assert_eq!(byte, 0x83);
//! assert_eq!(decode(byte), Ok(event));
//! assert!(decode(SENTINEL).is_err());
//! # let _ = Direction::Press;
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod event;
pub mod layout;
pub mod wire;

pub use event::{CommandEvent, Direction, EncodeError, MAX_ID};
pub use layout::{
    button_id, encoder_id, Channel, BUTTON_OFFSET, ENCODER_OFFSETS, ENCODER_SLOT_WIDTH,
    MAX_BUTTONS, MAX_ENCODERS,
};
pub use wire::{decode, encode, DecodeError, SENTINEL};
