//! keybus aggregator for RP2040.
//!
//! Polls every keybus peripheral over I2C, maps the events they return
//! to keys and types them on the host as a USB boot keyboard.
//!
//! # Hardware Configuration
//!
//! | Function | GPIO | Description |
//! |----------|------|-------------|
//! | I2C0 SDA | 20   | Bus to the peripherals (controller mode) |
//! | I2C0 SCL | 21   | |
//! | LED      | 25   | On-board LED (toggles on poll errors) |
//!
//! # Architecture
//!
//! The firmware uses the Embassy async runtime with two tasks:
//!
//! - **USB Task**: Manages the USB device stack
//! - **Poll Task**: Every [`POLL_INTERVAL`](keybus_core::config::POLL_INTERVAL)
//!   runs one [`Aggregator::poll_cycle`](keybus_core::Aggregator::poll_cycle)
//!   over the device table
//!
//! # Modules
//!
//! - [`timed_bus`]: per-read deadline for the bus ([`TimedBus`])
//! - [`usb_output`]: USB HID keyboard sink ([`UsbKeyboard`])
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)

#![no_std]

pub use keybus_core::{
    config, Aggregator, BusError, BusTransport, CycleSummary, Device, EmitError, I2cTransport,
    KeyEmitter, PollStats, ReportEmitter, ReportWriter,
};

pub mod timed_bus;
pub mod usb_output;

pub use timed_bus::{TimedBus, READ_TIMEOUT};
pub use usb_output::{configure_usb_hid, KeyboardRequestHandler, KeyboardWriter, UsbKeyboard};
