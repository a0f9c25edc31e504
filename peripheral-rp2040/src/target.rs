//! I2C target side of the bus protocol.

use defmt::{debug, warn};
use embassy_rp::i2c_slave::{Command, I2cSlave};
use embassy_rp::peripherals::I2C0;
use keybus_core::config::QUEUE_CAPACITY;
use keybus_core::proto::SENTINEL;
use keybus_core::BusResponder;

/// Answer bus requests forever.
///
/// Each read gets one event (or the sentinel) followed by sentinel fill
/// for as many bytes as the controller clocks out.
pub async fn serve(
    mut i2c: I2cSlave<'static, I2C0>,
    mut responder: BusResponder<'static, QUEUE_CAPACITY>,
) -> ! {
    let mut buf = [0u8; 8];
    loop {
        match i2c.listen(&mut buf).await {
            Ok(Command::Read) => respond(&mut i2c, &mut responder).await,
            Ok(Command::WriteRead(len)) => {
                responder.on_write(len);
                respond(&mut i2c, &mut responder).await;
            }
            Ok(Command::Write(len)) | Ok(Command::GeneralCall(len)) => responder.on_write(len),
            Err(e) => debug!("i2c listen error: {:?}", e),
        }
    }
}

async fn respond(
    i2c: &mut I2cSlave<'static, I2C0>,
    responder: &mut BusResponder<'static, QUEUE_CAPACITY>,
) {
    let mut event = [SENTINEL; 1];
    responder.on_read(&mut event);
    if let Err(e) = i2c.respond_and_fill(&event, SENTINEL).await {
        // The event is gone either way; the aggregator treats this as no event
        warn!("response to read aborted: {:?}", e);
    }
}
