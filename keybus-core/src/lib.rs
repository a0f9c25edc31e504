//! Platform-agnostic input aggregation for keybus nodes.
//!
//! This crate holds everything in a keybus system that has behaviour
//! worth testing, without any chip-specific dependencies. The firmware
//! crates only wire pins, the bus peripheral and USB to it.
//!
//! # Overview
//!
//! Peripheral side:
//!
//! - [`debounce`]: time-based debouncing ([`Debouncer`])
//! - [`encoder`]: quadrature decoding with synthesized releases ([`EncoderBank`])
//! - [`queue`]: bounded drop-oldest SPSC queue ([`EventQueue`])
//! - [`scanner`]: per-scan pipeline from pin levels to queued events ([`PeripheralScanner`])
//! - [`responder`]: answers bus reads from the queue ([`BusResponder`])
//!
//! Aggregator side:
//!
//! - [`bus`]: one-byte request transport ([`BusTransport`])
//! - [`keymap`]: id to key tables ([`KeyMap`], [`Device`])
//! - [`emit`]: key output trait ([`KeyEmitter`]) and a boot-report emitter
//! - [`aggregator`]: the polling loop ([`Aggregator`])
//!
//! Shared: [`config`] (build-time constants and the device table) and
//! [`time`] (wrapping millisecond instants).
//!
//! # Example
//!
//! ```rust
//! use keybus_core::{
//!     config::ENCODER_CONFIGS, time::millis, BusResponder, EventQueue, PeripheralScanner,
//!     PinState, ScanSample,
//! };
//!
//! let mut queue = EventQueue::<16>::new();
//! let (mut producer, consumer) = queue.split();
//! let mut responder = BusResponder::new(consumer);
//! let mut scanner = PeripheralScanner::new(ScanSample::<5, 2>::IDLE, ENCODER_CONFIGS, millis(0));
//!
//! let mut sample = ScanSample::IDLE;
//! sample.buttons[0] = PinState::Low;
//! scanner.scan(&sample, millis(0), &mut producer);
//! scanner.scan(&sample, millis(50), &mut producer);
//!
//! assert_eq!(responder.respond(), 0x00); // press of button 0
//! assert_eq!(responder.respond(), 0xFF); // nothing left
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt logging and formatting (for embedded builds)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// Must come first so the logging macros are visible to every module.
#[macro_use]
mod fmt;

pub mod aggregator;
pub mod bus;
pub mod config;
pub mod debounce;
pub mod emit;
pub mod encoder;
pub mod keymap;
pub mod queue;
pub mod report;
pub mod responder;
pub mod scanner;
pub mod time;

// Re-export main types at crate root
pub use aggregator::{Aggregator, CycleSummary, PollError, PollOutcome, PollStats};
pub use bus::{BusError, BusTransport, I2cTransport};
pub use debounce::{DebounceState, Debouncer};
pub use emit::{EmitError, KeyEmitter, ReportEmitter, ReportWriter};
pub use encoder::{EncoderBank, EncoderConfig, EncoderMode, EncoderState, Rotation, RotationEvents};
pub use keymap::{Device, KeyCode, KeyMap, KEYMAP_SIZE};
pub use queue::{Consumer, EventQueue, Producer};
pub use report::KeyboardReport;
pub use responder::BusResponder;
pub use scanner::{EncoderPins, EncoderSample, PeripheralPins, PeripheralScanner, ScanReport, ScanSample};
pub use time::{Duration, Instant};

pub use embedded_hal::digital::PinState;
pub use keybus_proto as proto;
