//! Aggregator-side bus transport.

use core::future::Future;

use embedded_hal_async::i2c::{Error as _, ErrorKind, I2c};

/// Error type for bus transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// The addressed device did not acknowledge.
    Nack,
    /// Bus fault (arbitration loss, overrun, ...).
    Io,
    /// The transfer did not complete in time.
    Timeout,
}

impl From<ErrorKind> for BusError {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NoAcknowledge(_) => BusError::Nack,
            _ => BusError::Io,
        }
    }
}

/// Async trait for "request one byte from address A".
pub trait BusTransport {
    /// Read a single byte from the device at `address`.
    fn read_byte(&mut self, address: u8) -> impl Future<Output = Result<u8, BusError>>;
}

/// [`BusTransport`] over any async I2C controller.
pub struct I2cTransport<I> {
    i2c: I,
}

impl<I: I2c> I2cTransport<I> {
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    pub fn inner_mut(&mut self) -> &mut I {
        &mut self.i2c
    }

    pub fn into_inner(self) -> I {
        self.i2c
    }
}

impl<I: I2c> BusTransport for I2cTransport<I> {
    async fn read_byte(&mut self, address: u8) -> Result<u8, BusError> {
        let mut buf = [0u8; 1];
        self.i2c
            .read(address, &mut buf)
            .await
            .map_err(|e| BusError::from(e.kind()))?;
        Ok(buf[0])
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::emit::tests::block_on;
    use embedded_hal_async::i2c::{ErrorType, NoAcknowledgeSource, Operation};
    use std::vec::Vec;

    #[derive(Debug)]
    struct MockError(ErrorKind);

    impl embedded_hal_async::i2c::Error for MockError {
        fn kind(&self) -> ErrorKind {
            self.0
        }
    }

    struct MockI2c {
        responses: Vec<Result<u8, ErrorKind>>,
        addresses: Vec<u8>,
    }

    impl ErrorType for MockI2c {
        type Error = MockError;
    }

    impl I2c for MockI2c {
        async fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            self.addresses.push(address);
            let response = self.responses.remove(0).map_err(MockError)?;
            for op in operations {
                if let Operation::Read(buf) = op {
                    buf.fill(response);
                }
            }
            Ok(())
        }
    }

    fn transport(responses: Vec<Result<u8, ErrorKind>>) -> I2cTransport<MockI2c> {
        I2cTransport::new(MockI2c {
            responses,
            addresses: Vec::new(),
        })
    }

    #[test]
    fn test_read_byte() {
        let mut bus = transport(std::vec![Ok(0x83), Ok(0xFF)]);
        assert_eq!(block_on(bus.read_byte(0x04)), Ok(0x83));
        assert_eq!(block_on(bus.read_byte(0x05)), Ok(0xFF));
        assert_eq!(bus.inner_mut().addresses, [0x04, 0x05]);
    }

    #[test]
    fn test_nack_maps_to_nack() {
        let mut bus = transport(std::vec![Err(ErrorKind::NoAcknowledge(
            NoAcknowledgeSource::Address
        ))]);
        assert_eq!(block_on(bus.read_byte(0x04)), Err(BusError::Nack));
    }

    #[test]
    fn test_other_errors_map_to_io() {
        let mut bus = transport(std::vec![
            Err(ErrorKind::ArbitrationLoss),
            Err(ErrorKind::Bus)
        ]);
        assert_eq!(block_on(bus.read_byte(0x04)), Err(BusError::Io));
        assert_eq!(block_on(bus.read_byte(0x04)), Err(BusError::Io));
    }
}
