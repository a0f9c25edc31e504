//! keybus peripheral node for RP2040.
//!
//! Samples five buttons and two rotary encoders, turns their activity
//! into keybus events and hands one event to the aggregator per I2C read.
//!
//! # Hardware Configuration
//!
//! | Function            | GPIO | Description |
//! |---------------------|------|-------------|
//! | Buttons 0-4         | 2-6  | Active low, internal pull-up |
//! | Encoder 0 switch    | 7    | Active low, toggles mode A/B |
//! | Encoder 0 clock     | 8    | |
//! | Encoder 0 data      | 9    | |
//! | Encoder 1 switch    | 10   | Wired but unused (no mode switching) |
//! | Encoder 1 clock     | 11   | |
//! | Encoder 1 data      | 12   | |
//! | I2C0 SDA            | 20   | Bus to the aggregator (target mode) |
//! | I2C0 SCL            | 21   | |
//! | LED                 | 25   | On while encoder 0 is in mode B |
//!
//! # Architecture
//!
//! - **Scan Task** (thread executor): samples every pin each millisecond
//!   and feeds [`PeripheralScanner`](keybus_core::PeripheralScanner),
//!   which pushes events into the shared queue.
//! - **Responder Task** (interrupt executor, higher priority): waits for
//!   I2C requests and answers each read with one event from the queue.
//!
//! The queue is lock-free, so the responder can preempt the scanner at
//! any point.
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)
//! - **`node-0`** (default) / **`node-1`**: Select the bus address

#![no_std]

// Ensure exactly one bus address is selected
#[cfg(all(feature = "node-0", feature = "node-1"))]
compile_error!("Cannot enable both `node-0` and `node-1` features - a node has a single bus address");

#[cfg(not(any(feature = "node-0", feature = "node-1")))]
compile_error!("Enable one of the `node-0` or `node-1` features to select the bus address");

pub use keybus_core::{
    config, BusResponder, EncoderMode, EventQueue, PeripheralPins, PeripheralScanner, Producer,
    ScanSample,
};

pub mod pins;
pub mod target;

pub use pins::{now, NodePins};
pub use target::serve;

/// Bus address this node answers at.
#[cfg(feature = "node-0")]
pub const BUS_ADDRESS: u8 = config::PERIPHERAL_ADDRESSES[0];

/// Bus address this node answers at.
#[cfg(all(feature = "node-1", not(feature = "node-0")))]
pub const BUS_ADDRESS: u8 = config::PERIPHERAL_ADDRESSES[1];
