//! Aggregator: polls peripherals and turns their events into keys.

use keybus_proto::{decode, Channel, DecodeError, Direction};

use crate::bus::{BusError, BusTransport};
use crate::emit::{EmitError, KeyEmitter};
use crate::keymap::{Device, KeyCode};

/// Result of polling one device once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollOutcome {
    /// The device had nothing queued.
    Idle,
    /// An event was decoded, mapped and emitted.
    Emitted { key: KeyCode, direction: Direction },
}

/// Error type for a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollError {
    /// No device at this index in the table.
    UnknownDevice(usize),
    /// The bus transfer failed.
    Bus(BusError),
    /// The byte is not a valid event.
    Malformed(u8),
    /// The id has no key in the device's map.
    InvalidId { address: u8, id: u8 },
    /// The emitter rejected the key.
    Emit(EmitError),
}

impl From<BusError> for PollError {
    fn from(e: BusError) -> Self {
        PollError::Bus(e)
    }
}

impl From<EmitError> for PollError {
    fn from(e: EmitError) -> Self {
        PollError::Emit(e)
    }
}

/// Cumulative counters since the aggregator was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollStats {
    pub cycles: u32,
    pub events: u32,
    pub idle: u32,
    pub invalid_ids: u32,
    pub malformed: u32,
    pub bus_errors: u32,
    pub emit_errors: u32,
}

impl PollStats {
    fn record(&mut self, result: &Result<PollOutcome, PollError>) {
        let counter = match result {
            Ok(PollOutcome::Idle) => &mut self.idle,
            Ok(PollOutcome::Emitted { .. }) => &mut self.events,
            Err(PollError::InvalidId { .. }) => &mut self.invalid_ids,
            Err(PollError::Malformed(_)) => &mut self.malformed,
            Err(PollError::Bus(_)) => &mut self.bus_errors,
            Err(PollError::Emit(_)) => &mut self.emit_errors,
            Err(PollError::UnknownDevice(_)) => return,
        };
        *counter = counter.wrapping_add(1);
    }
}

/// Outcome counts of one full round over the device table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleSummary {
    pub emitted: usize,
    pub idle: usize,
    pub failed: usize,
    /// Devices whose read failed on the bus; a subset of `failed`.
    pub unreachable: usize,
    /// Held keys were released because no device answered.
    pub released: bool,
}

/// Polls a fixed table of peripherals and drives key emission.
///
/// One poll asks one device for one byte. A sentinel, a malformed byte
/// and a bus error all mean "nothing this time"; the device is asked
/// again on the next cycle.
///
/// A cycle in which every device fails on the bus while keys are held
/// releases all keys, so a lost peripheral cannot leave a key stuck.
pub struct Aggregator<B, E, const D: usize> {
    bus: B,
    emitter: E,
    devices: [Device; D],
    stats: PollStats,
}

impl<B: BusTransport, E: KeyEmitter, const D: usize> Aggregator<B, E, D> {
    /// Create an aggregator over the given device table.
    pub fn new(bus: B, emitter: E, devices: [Device; D]) -> Self {
        Self {
            bus,
            emitter,
            devices,
            stats: PollStats::default(),
        }
    }

    /// Poll every device once, in table order.
    ///
    /// Waits for the emitter first when it is not ready, so events stay
    /// queued on the peripherals instead of being read and lost.
    pub async fn poll_cycle(&mut self) -> CycleSummary {
        if !self.emitter.is_ready() {
            warn!("key emitter not ready, waiting before polling");
            self.emitter.wait_ready().await;
            info!("key emitter ready again");
        }

        let mut summary = CycleSummary::default();
        for index in 0..D {
            match self.poll_device(index).await {
                Ok(PollOutcome::Idle) => summary.idle += 1,
                Ok(PollOutcome::Emitted { .. }) => summary.emitted += 1,
                Err(PollError::Bus(_)) => {
                    summary.failed += 1;
                    summary.unreachable += 1;
                }
                Err(_) => summary.failed += 1,
            }
        }
        self.stats.cycles = self.stats.cycles.wrapping_add(1);

        if D > 0 && summary.unreachable == D && self.emitter.any_held() {
            warn!("no device answered while keys are held, releasing all");
            match self.emitter.release_all().await {
                Ok(()) => summary.released = true,
                Err(e) => {
                    error!("release of held keys failed: {:?}", e);
                    self.stats.emit_errors = self.stats.emit_errors.wrapping_add(1);
                }
            }
        }
        summary
    }

    /// Request one byte from device `index` and act on it.
    pub async fn poll_device(&mut self, index: usize) -> Result<PollOutcome, PollError> {
        let result = self.poll_inner(index).await;
        self.stats.record(&result);
        result
    }

    async fn poll_inner(&mut self, index: usize) -> Result<PollOutcome, PollError> {
        let device = *self
            .devices
            .get(index)
            .ok_or(PollError::UnknownDevice(index))?;

        let byte = match self.bus.read_byte(device.address).await {
            Ok(byte) => byte,
            Err(e) => {
                debug!("bus error from {=u8:#x}: {:?}", device.address, e);
                return Err(e.into());
            }
        };

        let event = match decode(byte) {
            Ok(event) => event,
            Err(DecodeError::Empty) => return Ok(PollOutcome::Idle),
            Err(DecodeError::Malformed(byte)) => {
                warn!("malformed byte {=u8:#x} from {=u8:#x}", byte, device.address);
                return Err(PollError::Malformed(byte));
            }
        };

        let Some(key) = device.keymap.lookup(event.id()) else {
            match Channel::of_id(event.id()) {
                Some((channel, _)) => {
                    warn!("no key bound for {:?} on {=u8:#x}", channel, device.address)
                }
                None => warn!("invalid id {} from {=u8:#x}", event.id(), device.address),
            }
            return Err(PollError::InvalidId {
                address: device.address,
                id: event.id(),
            });
        };

        let direction = event.direction();
        let emitted = match direction {
            Direction::Press => self.emitter.key_down(key).await,
            Direction::Release => self.emitter.key_up(key).await,
        };
        if let Err(e) = emitted {
            error!("emit {:?} {:?} failed: {:?}", key, direction, e);
            return Err(e.into());
        }

        trace!("{=u8:#x}: {:?} {:?}", device.address, key, direction);
        Ok(PollOutcome::Emitted { key, direction })
    }

    /// Cumulative counters.
    pub fn stats(&self) -> &PollStats {
        &self.stats
    }

    pub fn devices(&self) -> &[Device; D] {
        &self.devices
    }

    /// Get a reference to the bus transport.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Get a mutable reference to the bus transport.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Get a reference to the key emitter.
    pub fn emitter(&self) -> &E {
        &self.emitter
    }

    /// Get a mutable reference to the key emitter.
    pub fn emitter_mut(&mut self) -> &mut E {
        &mut self.emitter
    }

    /// Decompose the aggregator into its bus and emitter.
    pub fn into_parts(self) -> (B, E) {
        (self.bus, self.emitter)
    }
}
