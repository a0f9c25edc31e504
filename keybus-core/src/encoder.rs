//! Rotary encoder decoding with synthesized key releases.
//!
//! Detents are detected on the falling edge of the clock line; the data
//! line at that instant gives the direction. A rotary encoder has no
//! "release", so every accepted detent becomes a press that is paired
//! with a release once [`ENCODER_DELAY`](crate::config::ENCODER_DELAY)
//! has passed.
//!
//! At most one value per encoder is ever pressed-but-not-released. A
//! detent seen while a release is outstanding waits in a one-slot
//! deferral and is pressed as soon as that release fires; further
//! detents in the meantime are dropped.

use embedded_hal::digital::PinState;

use crate::time::{elapsed, Duration, Instant};

/// Values for (clockwise, counter-clockwise) in mode A.
pub const MODE_A_VALUES: [u8; 2] = [0, 1];

/// Values for (clockwise, counter-clockwise) in mode B.
pub const MODE_B_VALUES: [u8; 2] = [2, 3];

/// Which value table an encoder decodes into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncoderMode {
    #[default]
    A,
    B,
}

impl EncoderMode {
    #[inline]
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            EncoderMode::A => EncoderMode::B,
            EncoderMode::B => EncoderMode::A,
        }
    }

    #[inline]
    #[must_use]
    pub const fn values(self) -> [u8; 2] {
        match self {
            EncoderMode::A => MODE_A_VALUES,
            EncoderMode::B => MODE_B_VALUES,
        }
    }
}

/// Direction of one detent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

impl Rotation {
    /// Direction implied by the data line at a clock falling edge.
    #[inline]
    #[must_use]
    pub const fn from_data(data: PinState) -> Self {
        match data {
            PinState::Low => Rotation::Clockwise,
            PinState::High => Rotation::CounterClockwise,
        }
    }

    #[inline]
    const fn index(self) -> usize {
        match self {
            Rotation::Clockwise => 0,
            Rotation::CounterClockwise => 1,
        }
    }
}

/// Static description of one encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Whether the shaft switch toggles between mode A and mode B.
    /// Encoders without one always decode with mode A values.
    pub has_mode_switch: bool,
}

/// A pressed value waiting for its synthesized release.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingRelease {
    pub value: u8,
    pub since: Instant,
}

/// Events produced by one observation, in emission order: the release
/// (if due) always precedes the press.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RotationEvents {
    pub release: Option<u8>,
    pub press: Option<u8>,
}

impl RotationEvents {
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.release.is_none() && self.press.is_none()
    }
}

/// Decoder state for one encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderState {
    config: EncoderConfig,
    mode: EncoderMode,
    last_clock: PinState,
    pending_release: Option<PendingRelease>,
    deferred: Option<u8>,
    dropped: u32,
}

impl EncoderState {
    #[must_use]
    pub const fn new(config: EncoderConfig, initial_clock: PinState) -> Self {
        Self {
            config,
            mode: EncoderMode::A,
            last_clock: initial_clock,
            pending_release: None,
            deferred: None,
            dropped: 0,
        }
    }

    /// Feed one sample of the clock and data lines.
    pub fn observe(
        &mut self,
        clock: PinState,
        data: PinState,
        now: Instant,
        delay: Duration,
    ) -> RotationEvents {
        let mut events = RotationEvents::default();

        if let Some(pending) = self.pending_release {
            if elapsed(pending.since, now) >= delay {
                self.pending_release = None;
                events.release = Some(pending.value);
            }
        }

        if self.pending_release.is_none() {
            if let Some(value) = self.deferred.take() {
                self.begin_press(value, now);
                events.press = Some(value);
            }
        }

        let falling = self.last_clock == PinState::High && clock == PinState::Low;
        self.last_clock = clock;
        if !falling {
            return events;
        }

        let value = self.value_for(Rotation::from_data(data));
        if self.pending_release.is_none() {
            self.begin_press(value, now);
            events.press = Some(value);
        } else if self.deferred.is_none() {
            self.deferred = Some(value);
        } else {
            self.dropped = self.dropped.wrapping_add(1);
        }

        events
    }

    /// Value a detent in `rotation` decodes to under the current mode.
    #[must_use]
    pub const fn value_for(&self, rotation: Rotation) -> u8 {
        self.effective_mode().values()[rotation.index()]
    }

    /// Flip between mode A and B. No effect on encoders without a switch.
    ///
    /// Returns the mode now in effect.
    pub fn toggle_mode(&mut self) -> EncoderMode {
        if self.config.has_mode_switch {
            self.mode = self.mode.toggled();
        }
        self.effective_mode()
    }

    #[inline]
    #[must_use]
    pub const fn effective_mode(&self) -> EncoderMode {
        if self.config.has_mode_switch {
            self.mode
        } else {
            EncoderMode::A
        }
    }

    #[inline]
    #[must_use]
    pub const fn config(&self) -> EncoderConfig {
        self.config
    }

    #[inline]
    #[must_use]
    pub const fn pending_release(&self) -> Option<PendingRelease> {
        self.pending_release
    }

    #[inline]
    #[must_use]
    pub const fn deferred(&self) -> Option<u8> {
        self.deferred
    }

    /// Detents discarded because the deferral slot was full.
    #[inline]
    #[must_use]
    pub const fn dropped(&self) -> u32 {
        self.dropped
    }

    fn begin_press(&mut self, value: u8, now: Instant) {
        self.pending_release = Some(PendingRelease { value, since: now });
    }
}

/// Decoder state for a fixed set of encoders, addressed by index.
#[derive(Clone, Debug)]
pub struct EncoderBank<const N: usize> {
    encoders: [EncoderState; N],
    delay: Duration,
}

impl<const N: usize> EncoderBank<N> {
    #[must_use]
    pub fn new(configs: [EncoderConfig; N], initial_clock: [PinState; N], delay: Duration) -> Self {
        let mut index = 0;
        Self {
            encoders: configs.map(|config| {
                let state = EncoderState::new(config, initial_clock[index]);
                index += 1;
                state
            }),
            delay,
        }
    }

    /// Feed one sample for `encoder`. Out-of-range indices yield nothing.
    pub fn observe(
        &mut self,
        encoder: usize,
        clock: PinState,
        data: PinState,
        now: Instant,
    ) -> RotationEvents {
        let delay = self.delay;
        match self.encoders.get_mut(encoder) {
            Some(state) => state.observe(clock, data, now, delay),
            None => RotationEvents::default(),
        }
    }

    /// Toggle the mode of `encoder`, returning the mode now in effect.
    pub fn toggle_mode(&mut self, encoder: usize) -> Option<EncoderMode> {
        self.encoders.get_mut(encoder).map(EncoderState::toggle_mode)
    }

    #[must_use]
    pub fn get(&self, encoder: usize) -> Option<&EncoderState> {
        self.encoders.get(encoder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::millis;
    use PinState::{High, Low};

    const DELAY: Duration = Duration::from_ticks(50);
    const SWITCHED: EncoderConfig = EncoderConfig {
        has_mode_switch: true,
    };
    const PLAIN: EncoderConfig = EncoderConfig {
        has_mode_switch: false,
    };

    fn detent(state: &mut EncoderState, data: PinState, t: u32) -> RotationEvents {
        let events = state.observe(Low, data, millis(t), DELAY);
        let idle = state.observe(High, data, millis(t), DELAY);
        assert!(idle.is_empty());
        events
    }

    #[test]
    fn test_falling_edge_clockwise_mode_a() {
        let mut state = EncoderState::new(SWITCHED, High);
        let events = state.observe(Low, Low, millis(0), DELAY);
        assert_eq!(
            events,
            RotationEvents {
                release: None,
                press: Some(MODE_A_VALUES[0])
            }
        );
    }

    #[test]
    fn test_data_high_is_counter_clockwise() {
        let mut state = EncoderState::new(SWITCHED, High);
        let events = state.observe(Low, High, millis(0), DELAY);
        assert_eq!(events.press, Some(MODE_A_VALUES[1]));
    }

    #[test]
    fn test_no_event_without_falling_edge() {
        let mut state = EncoderState::new(SWITCHED, Low);
        // Clock stays low: no edge
        assert!(state.observe(Low, Low, millis(0), DELAY).is_empty());
        assert!(state.observe(Low, High, millis(1), DELAY).is_empty());
        // Rising edge is ignored
        assert!(state.observe(High, Low, millis(2), DELAY).is_empty());
        assert!(state.observe(High, High, millis(3), DELAY).is_empty());
    }

    #[test]
    fn test_release_fires_after_delay_not_before() {
        let mut state = EncoderState::new(SWITCHED, High);
        assert_eq!(state.observe(Low, Low, millis(0), DELAY).press, Some(0));

        for t in [1, 10, 30, 49] {
            assert!(state.observe(Low, Low, millis(t), DELAY).is_empty());
        }

        let events = state.observe(Low, Low, millis(50), DELAY);
        assert_eq!(events.release, Some(0));
        assert_eq!(events.press, None);
        assert!(state.pending_release().is_none());

        // Exactly one release
        assert!(state.observe(Low, Low, millis(120), DELAY).is_empty());
    }

    #[test]
    fn test_detent_during_pending_is_deferred() {
        let mut state = EncoderState::new(SWITCHED, High);
        assert_eq!(detent(&mut state, Low, 0).press, Some(0));

        // Counter-clockwise detent inside the window is held, not pressed
        assert!(detent(&mut state, High, 20).is_empty());
        assert_eq!(state.deferred(), Some(1));

        let events = state.observe(High, High, millis(50), DELAY);
        assert_eq!(
            events,
            RotationEvents {
                release: Some(0),
                press: Some(1)
            }
        );

        let pending = state.pending_release().unwrap();
        assert_eq!(pending.value, 1);
        assert_eq!(pending.since, millis(50));

        let events = state.observe(High, High, millis(100), DELAY);
        assert_eq!(events.release, Some(1));
    }

    #[test]
    fn test_deferral_slot_holds_one() {
        let mut state = EncoderState::new(SWITCHED, High);
        detent(&mut state, Low, 0);
        detent(&mut state, Low, 10);
        detent(&mut state, High, 20);
        detent(&mut state, High, 30);

        assert_eq!(state.deferred(), Some(0));
        assert_eq!(state.dropped(), 2);
    }

    #[test]
    fn test_edge_on_release_tick_presses_immediately() {
        let mut state = EncoderState::new(SWITCHED, High);
        detent(&mut state, Low, 0);
        let events = state.observe(Low, High, millis(50), DELAY);
        assert_eq!(
            events,
            RotationEvents {
                release: Some(0),
                press: Some(1)
            }
        );
    }

    #[test]
    fn test_mode_b_values() {
        let mut state = EncoderState::new(SWITCHED, High);
        assert_eq!(state.toggle_mode(), EncoderMode::B);
        assert_eq!(detent(&mut state, Low, 0).press, Some(MODE_B_VALUES[0]));
        assert_eq!(state.value_for(Rotation::CounterClockwise), MODE_B_VALUES[1]);

        assert_eq!(state.toggle_mode(), EncoderMode::A);
        assert_eq!(state.value_for(Rotation::Clockwise), MODE_A_VALUES[0]);
    }

    #[test]
    fn test_encoder_without_switch_stays_in_mode_a() {
        let mut state = EncoderState::new(PLAIN, High);
        assert_eq!(state.toggle_mode(), EncoderMode::A);
        assert_eq!(detent(&mut state, High, 0).press, Some(MODE_A_VALUES[1]));
    }

    #[test]
    fn test_every_press_has_matching_release() {
        // Spin the encoder for a while and check press/release pairing.
        let mut state = EncoderState::new(SWITCHED, High);
        let mut outstanding: Option<(u8, u32)> = None;
        let mut pairs = 0;

        for t in 0..1_000u32 {
            let clock = if (t / 7) % 2 == 0 { High } else { Low };
            let data = if (t / 90) % 2 == 0 { Low } else { High };
            let events = state.observe(clock, data, millis(t), DELAY);

            if let Some(value) = events.release {
                let (pressed, at) = outstanding.take().expect("release without press");
                assert_eq!(pressed, value);
                assert!(t - at >= 50);
                pairs += 1;
            }
            if let Some(value) = events.press {
                assert!(outstanding.is_none(), "second press before release");
                outstanding = Some((value, t));
            }
        }

        assert!(pairs > 10);
    }

    #[test]
    fn test_bank_routes_by_index() {
        let mut bank = EncoderBank::new([SWITCHED, PLAIN], [High, High], DELAY);
        assert_eq!(bank.toggle_mode(0), Some(EncoderMode::B));
        assert_eq!(bank.toggle_mode(1), Some(EncoderMode::A));
        assert_eq!(bank.toggle_mode(2), None);

        assert_eq!(bank.observe(0, Low, Low, millis(0)).press, Some(2));
        assert_eq!(bank.observe(1, Low, Low, millis(0)).press, Some(0));
        assert!(bank.observe(3, Low, Low, millis(0)).is_empty());
        assert!(bank.get(0).unwrap().pending_release().is_some());
    }
}
