//! Peripheral-side bus responder.
//!
//! Answers every read request from the aggregator with the oldest queued
//! event, or [`SENTINEL`] when there is none. It never blocks and never
//! waits for the scanner.

use keybus_proto::SENTINEL;

use crate::queue::Consumer;

/// Reading side of the bus protocol on a peripheral node.
pub struct BusResponder<'a, const N: usize> {
    consumer: Consumer<'a, N>,
    served: u32,
    idle: u32,
}

impl<'a, const N: usize> BusResponder<'a, N> {
    pub fn new(consumer: Consumer<'a, N>) -> Self {
        Self {
            consumer,
            served: 0,
            idle: 0,
        }
    }

    /// Byte to send for one read request.
    pub fn respond(&mut self) -> u8 {
        let byte = self.consumer.pop_or_sentinel();
        if byte == SENTINEL {
            self.idle = self.idle.wrapping_add(1);
        } else {
            self.served = self.served.wrapping_add(1);
            trace!("serving event {=u8:#x}", byte);
        }
        byte
    }

    /// Fill the response buffer for a read of `buf.len()` bytes.
    ///
    /// Only the first byte carries an event; the rest are sentinel fill
    /// so one request never consumes more than one event. Returns the
    /// number of bytes written.
    pub fn on_read(&mut self, buf: &mut [u8]) -> usize {
        let Some((first, rest)) = buf.split_first_mut() else {
            return 0;
        };
        *first = self.respond();
        rest.fill(SENTINEL);
        buf.len()
    }

    /// The controller wrote `len` bytes; the protocol defines no writes.
    pub fn on_write(&mut self, len: usize) {
        warn!("ignoring {} byte write from controller", len);
    }

    /// Events handed to the controller.
    #[must_use]
    pub const fn served(&self) -> u32 {
        self.served
    }

    /// Requests answered with the sentinel.
    #[must_use]
    pub const fn idle(&self) -> u32 {
        self.idle
    }

    /// Events still queued.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.consumer.len()
    }
}
