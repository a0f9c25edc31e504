//! Build-time configuration shared by both node types.
//!
//! Nothing here is discovered or persisted; changing the layout or the
//! key maps means rebuilding the firmware.

use crate::encoder::EncoderConfig;
use crate::keymap::{Device, KeyCode, KeyMap};
use crate::time::Duration;
use keybus_proto::{button_id, encoder_id};

/// A level change must hold this long before it is accepted.
pub const DEBOUNCE_DELAY: Duration = Duration::from_ticks(50);

/// Delay between a rotation press and its synthesized release.
pub const ENCODER_DELAY: Duration = Duration::from_ticks(50);

/// Aggregator polling period.
pub const POLL_INTERVAL: Duration = Duration::from_ticks(50);

/// Capacity of each peripheral's event queue.
pub const QUEUE_CAPACITY: usize = 16;

/// Buttons per peripheral node.
pub const BUTTON_COUNT: usize = 5;

/// Encoders per peripheral node.
pub const ENCODER_COUNT: usize = 2;

/// Per-encoder configuration. Only encoder 0 has a mode switch.
pub const ENCODER_CONFIGS: [EncoderConfig; ENCODER_COUNT] = [
    EncoderConfig {
        has_mode_switch: true,
    },
    EncoderConfig {
        has_mode_switch: false,
    },
];

/// Bus addresses of the peripheral nodes, in polling order.
pub const PERIPHERAL_ADDRESSES: [u8; 2] = [0x04, 0x05];

/// Number of peripherals the aggregator polls.
pub const DEVICE_COUNT: usize = PERIPHERAL_ADDRESSES.len();

const fn button(map: KeyMap, index: usize, key: KeyCode) -> KeyMap {
    match button_id(index) {
        Some(id) => map.with(id, key),
        None => map,
    }
}

const fn encoder(map: KeyMap, encoder: usize, value: u8, key: KeyCode) -> KeyMap {
    match encoder_id(encoder, value) {
        Some(id) => map.with(id, key),
        None => map,
    }
}

const DEVICE_0_KEYMAP: KeyMap = {
    let map = KeyMap::EMPTY;
    let map = button(map, 0, KeyCode::F13);
    let map = button(map, 1, KeyCode::F14);
    let map = button(map, 2, KeyCode::F15);
    let map = button(map, 3, KeyCode::F16);
    let map = button(map, 4, KeyCode::F17);
    // Encoder 0: volume in mode A (Linux hosts only), arrow keys in mode B
    let map = encoder(map, 0, 0, KeyCode::VOLUME_UP);
    let map = encoder(map, 0, 1, KeyCode::VOLUME_DOWN);
    let map = encoder(map, 0, 2, KeyCode::RIGHT);
    let map = encoder(map, 0, 3, KeyCode::LEFT);
    let map = encoder(map, 1, 0, KeyCode::PAGE_DOWN);
    encoder(map, 1, 1, KeyCode::PAGE_UP)
};

const DEVICE_1_KEYMAP: KeyMap = {
    let map = KeyMap::EMPTY;
    let map = button(map, 0, KeyCode::F18);
    let map = button(map, 1, KeyCode::F19);
    let map = button(map, 2, KeyCode::F20);
    let map = button(map, 3, KeyCode::F21);
    let map = button(map, 4, KeyCode::F22);
    let map = encoder(map, 0, 0, KeyCode::DOWN);
    let map = encoder(map, 0, 1, KeyCode::UP);
    let map = encoder(map, 0, 2, KeyCode::END);
    let map = encoder(map, 0, 3, KeyCode::HOME);
    let map = encoder(map, 1, 0, KeyCode::F23);
    encoder(map, 1, 1, KeyCode::F24)
};

/// Device table polled by the aggregator, in round-robin order.
pub const DEFAULT_DEVICES: [Device; DEVICE_COUNT] = [
    Device::new(PERIPHERAL_ADDRESSES[0], DEVICE_0_KEYMAP),
    Device::new(PERIPHERAL_ADDRESSES[1], DEVICE_1_KEYMAP),
];
