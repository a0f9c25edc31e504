//! Bus transport with a per-request deadline.

use embassy_time::{with_timeout, Duration};
use keybus_core::{BusError, BusTransport};

/// Default deadline for one single-byte read.
pub const READ_TIMEOUT: Duration = Duration::from_millis(10);

/// Wraps a [`BusTransport`] so a stuck transfer fails with
/// [`BusError::Timeout`] instead of stalling the poll loop.
pub struct TimedBus<T> {
    inner: T,
    timeout: Duration,
}

impl<T: BusTransport> TimedBus<T> {
    pub fn new(inner: T, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

impl<T: BusTransport> BusTransport for TimedBus<T> {
    async fn read_byte(&mut self, address: u8) -> Result<u8, BusError> {
        with_timeout(self.timeout, self.inner.read_byte(address))
            .await
            .map_err(|_| BusError::Timeout)?
    }
}
