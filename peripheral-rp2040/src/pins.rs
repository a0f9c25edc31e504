//! GPIO setup and the millisecond clock for the scanner.

use embassy_rp::gpio::{Input, Level, Pin, Pull};
use embassy_rp::Peri;
use keybus_core::config::{BUTTON_COUNT, ENCODER_COUNT};
use keybus_core::{EncoderMode, EncoderPins, Instant, PeripheralPins};

/// Every input of this node.
pub type NodePins = PeripheralPins<Input<'static>, BUTTON_COUNT, ENCODER_COUNT>;

/// Configure a push-button input (active low).
pub fn button(pin: Peri<'static, impl Pin>) -> Input<'static> {
    Input::new(pin, Pull::Up)
}

/// Configure the three lines of one encoder.
///
/// Clock and data are pulled up on the encoder board; the shaft switch
/// uses the internal pull-up.
pub fn encoder(
    clock: Peri<'static, impl Pin>,
    data: Peri<'static, impl Pin>,
    switch: Peri<'static, impl Pin>,
) -> EncoderPins<Input<'static>> {
    EncoderPins {
        clock: Input::new(clock, Pull::None),
        data: Input::new(data, Pull::None),
        switch: Some(Input::new(switch, Pull::Up)),
    }
}

/// Current time on the scanner's wrapping millisecond tick.
pub fn now() -> Instant {
    // Truncation wraps every ~49 days; all comparisons are wrap-tolerant.
    Instant::from_ticks(embassy_time::Instant::now().as_millis() as u32)
}

/// LED level showing an encoder mode: lit for mode B.
pub fn mode_led(mode: EncoderMode) -> Level {
    match mode {
        EncoderMode::A => Level::Low,
        EncoderMode::B => Level::High,
    }
}
