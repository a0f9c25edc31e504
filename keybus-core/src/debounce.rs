//! Time-based debouncing of digital inputs.
//!
//! A level change is accepted only after the raw signal has held the new
//! level for at least the debounce delay. Every raw flip restarts the
//! wait, so a signal that keeps bouncing produces nothing until it
//! settles, and then exactly one transition to the settled level.

use embedded_hal::digital::PinState;

use crate::time::{elapsed, Duration, Instant};

/// Debounce bookkeeping for one channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebounceState {
    /// Level seen on the previous observation.
    last_raw: PinState,
    /// Last accepted level.
    stable: PinState,
    /// When `last_raw` last changed.
    last_change: Instant,
}

impl DebounceState {
    /// Start with `initial` as both the raw and the stable level.
    #[must_use]
    pub const fn new(initial: PinState, now: Instant) -> Self {
        Self {
            last_raw: initial,
            stable: initial,
            last_change: now,
        }
    }

    /// Feed one raw sample.
    ///
    /// Returns the new stable level when a transition is accepted.
    pub fn observe(&mut self, raw: PinState, now: Instant, delay: Duration) -> Option<PinState> {
        if raw != self.last_raw {
            self.last_raw = raw;
            self.last_change = now;
        }

        if raw == self.stable || elapsed(self.last_change, now) < delay {
            return None;
        }

        self.stable = raw;
        Some(raw)
    }

    /// The last accepted level.
    #[inline]
    #[must_use]
    pub const fn stable(&self) -> PinState {
        self.stable
    }
}

/// Debounce state for a fixed set of channels, addressed by index.
#[derive(Clone, Debug)]
pub struct Debouncer<const N: usize> {
    channels: [DebounceState; N],
    delay: Duration,
}

impl<const N: usize> Debouncer<N> {
    /// Create a bank whose channels start at the given levels.
    #[must_use]
    pub fn new(initial: [PinState; N], now: Instant, delay: Duration) -> Self {
        Self {
            channels: initial.map(|level| DebounceState::new(level, now)),
            delay,
        }
    }

    /// Feed one raw sample for `channel`.
    ///
    /// Out-of-range channels never report a transition.
    pub fn observe(&mut self, channel: usize, raw: PinState, now: Instant) -> Option<PinState> {
        let delay = self.delay;
        self.channels
            .get_mut(channel)
            .and_then(|state| state.observe(raw, now, delay))
    }

    /// Stable level of `channel`.
    #[must_use]
    pub fn stable(&self, channel: usize) -> Option<PinState> {
        self.channels.get(channel).map(DebounceState::stable)
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        N
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }
}
