//! Peripheral-side input scanning.
//!
//! [`PeripheralScanner`] owns the per-channel debounce and decoder state
//! of one peripheral node. Each call to [`PeripheralScanner::scan`] takes
//! one sample of every input, runs it through the debouncers and encoder
//! decoders, and pushes the resulting [`CommandEvent`]s into the event
//! queue.
//!
//! Buttons and encoder switches are wired active-low (pull-ups), so a
//! stable `Low` is a press.

use embedded_hal::digital::{InputPin, PinState};
use keybus_proto::{button_id, encoder_id, CommandEvent, Direction};

use crate::config::{DEBOUNCE_DELAY, ENCODER_DELAY};
use crate::debounce::Debouncer;
use crate::encoder::{EncoderBank, EncoderConfig, EncoderMode, RotationEvents};
use crate::queue::Producer;
use crate::time::Instant;

/// Levels of one encoder's lines at a sampling instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderSample {
    pub clock: PinState,
    pub data: PinState,
    /// Shaft switch; `High` (released) for encoders without one.
    pub switch: PinState,
}

impl EncoderSample {
    /// Lines at rest: clock high, data high, switch released.
    pub const IDLE: Self = Self {
        clock: PinState::High,
        data: PinState::High,
        switch: PinState::High,
    };
}

/// Levels of every input of a node at a sampling instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanSample<const B: usize, const E: usize> {
    pub buttons: [PinState; B],
    pub encoders: [EncoderSample; E],
}

impl<const B: usize, const E: usize> ScanSample<B, E> {
    /// All buttons released and all encoders at rest.
    pub const IDLE: Self = Self {
        buttons: [PinState::High; B],
        encoders: [EncoderSample::IDLE; E],
    };
}

/// Pins of one encoder.
pub struct EncoderPins<P> {
    pub clock: P,
    pub data: P,
    pub switch: Option<P>,
}

/// Every input pin of a peripheral node.
pub struct PeripheralPins<P, const B: usize, const E: usize> {
    pub buttons: [P; B],
    pub encoders: [EncoderPins<P>; E],
}

impl<P: InputPin, const B: usize, const E: usize> PeripheralPins<P, B, E> {
    /// Read every pin.
    ///
    /// A pin that fails to read keeps its level from `previous`, so a
    /// transient read error never looks like a transition.
    pub fn sample(&mut self, previous: &ScanSample<B, E>) -> ScanSample<B, E> {
        let mut sample = *previous;

        for (index, pin) in self.buttons.iter_mut().enumerate() {
            sample.buttons[index] = read_level(pin, previous.buttons[index]);
        }

        for (index, pins) in self.encoders.iter_mut().enumerate() {
            let last = previous.encoders[index];
            sample.encoders[index] = EncoderSample {
                clock: read_level(&mut pins.clock, last.clock),
                data: read_level(&mut pins.data, last.data),
                switch: match pins.switch.as_mut() {
                    Some(pin) => read_level(pin, last.switch),
                    None => PinState::High,
                },
            };
        }

        sample
    }
}

fn read_level<P: InputPin>(pin: &mut P, fallback: PinState) -> PinState {
    match pin.is_high() {
        Ok(high) => PinState::from(high),
        Err(_) => {
            warn!("pin read failed, keeping previous level");
            fallback
        }
    }
}

/// Summary of one scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Events pushed into the queue.
    pub queued: usize,
    /// Events that evicted an older queued entry.
    pub evicted: usize,
    /// Encoder whose mode was toggled this scan, with its new mode.
    pub mode_change: Option<(usize, EncoderMode)>,
}

/// Debounce and decoder state for every channel of one peripheral node.
pub struct PeripheralScanner<const B: usize, const E: usize> {
    buttons: Debouncer<B>,
    switches: Debouncer<E>,
    encoders: EncoderBank<E>,
    last_sample: ScanSample<B, E>,
}

impl<const B: usize, const E: usize> PeripheralScanner<B, E> {
    /// Create a scanner seeded with the levels present at startup.
    #[must_use]
    pub fn new(initial: ScanSample<B, E>, configs: [EncoderConfig; E], now: Instant) -> Self {
        Self {
            buttons: Debouncer::new(initial.buttons, now, DEBOUNCE_DELAY),
            switches: Debouncer::new(initial.encoders.map(|e| e.switch), now, DEBOUNCE_DELAY),
            encoders: EncoderBank::new(configs, initial.encoders.map(|e| e.clock), ENCODER_DELAY),
            last_sample: initial,
        }
    }

    /// Sample `pins` and scan the result.
    pub fn scan_pins<P: InputPin, const N: usize>(
        &mut self,
        pins: &mut PeripheralPins<P, B, E>,
        now: Instant,
        queue: &mut Producer<'_, N>,
    ) -> ScanReport {
        let sample = pins.sample(&self.last_sample);
        self.scan(&sample, now, queue)
    }

    /// Process one sample, pushing any resulting events into `queue`.
    pub fn scan<const N: usize>(
        &mut self,
        sample: &ScanSample<B, E>,
        now: Instant,
        queue: &mut Producer<'_, N>,
    ) -> ScanReport {
        let mut report = ScanReport::default();

        for (index, &level) in sample.buttons.iter().enumerate() {
            let Some(stable) = self.buttons.observe(index, level, now) else {
                continue;
            };
            let direction = direction_for(stable);
            trace!("button {} {:?}", index, direction);
            if let Some(id) = button_id(index) {
                enqueue(queue, direction, id, &mut report);
            }
        }

        for (index, lines) in sample.encoders.iter().enumerate() {
            if self.switches.observe(index, lines.switch, now) == Some(PinState::Low) {
                report.mode_change = self.toggle_mode(index);
            }

            let events = self.encoders.observe(index, lines.clock, lines.data, now);
            self.enqueue_rotation(queue, index, events, &mut report);
        }

        self.last_sample = *sample;
        report
    }

    /// Current mode of `encoder`.
    #[must_use]
    pub fn mode(&self, encoder: usize) -> Option<EncoderMode> {
        self.encoders.get(encoder).map(|state| state.effective_mode())
    }

    /// The most recent sample seen.
    #[must_use]
    pub fn last_sample(&self) -> &ScanSample<B, E> {
        &self.last_sample
    }

    fn toggle_mode(&mut self, encoder: usize) -> Option<(usize, EncoderMode)> {
        let has_switch = self
            .encoders
            .get(encoder)
            .is_some_and(|state| state.config().has_mode_switch);
        if !has_switch {
            return None;
        }
        let mode = self.encoders.toggle_mode(encoder)?;
        info!("encoder {} switched to mode {:?}", encoder, mode);
        Some((encoder, mode))
    }

    fn enqueue_rotation<const N: usize>(
        &mut self,
        queue: &mut Producer<'_, N>,
        encoder: usize,
        events: RotationEvents,
        report: &mut ScanReport,
    ) {
        let ordered = [
            events.release.map(|value| (Direction::Release, value)),
            events.press.map(|value| (Direction::Press, value)),
        ];
        for (direction, value) in ordered.into_iter().flatten() {
            trace!("encoder {} value {} {:?}", encoder, value, direction);
            match encoder_id(encoder, value) {
                Some(id) => enqueue(queue, direction, id, report),
                None => warn!("encoder {} value {} has no wire id", encoder, value),
            }
        }
    }
}

#[inline]
const fn direction_for(stable: PinState) -> Direction {
    match stable {
        PinState::Low => Direction::Press,
        PinState::High => Direction::Release,
    }
}

fn enqueue<const N: usize>(
    queue: &mut Producer<'_, N>,
    direction: Direction,
    id: u8,
    report: &mut ScanReport,
) {
    match CommandEvent::new(direction, id) {
        Ok(event) => {
            if queue.push(event) {
                report.evicted += 1;
            }
            report.queued += 1;
        }
        Err(e) => error!("cannot encode event: {:?}", e),
    }
}
