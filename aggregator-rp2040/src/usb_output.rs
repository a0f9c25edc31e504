//! USB HID keyboard output.

use defmt::{debug, info};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_usb::class::hid::{HidWriter, ReportId, RequestHandler, State};
use embassy_usb::control::OutResponse;
use embassy_usb::driver::EndpointError;
use embassy_usb::Builder;
use keybus_core::report::REPORT_LEN;
use keybus_core::{EmitError, ReportWriter};
use usbd_hid::descriptor::{KeyboardReport, SerializedDescriptor};

/// HID writer for boot keyboard reports on the RP2040 USB peripheral.
pub type KeyboardWriter<'d> = HidWriter<'d, Driver<'d, USB>, REPORT_LEN>;

/// USB HID keyboard report sink.
///
/// Wraps an embassy-usb HID writer; [`ReportEmitter`](keybus_core::ReportEmitter)
/// sits on top and decides what to send.
pub struct UsbKeyboard<'d> {
    writer: KeyboardWriter<'d>,
    ready: bool,
}

impl<'d> UsbKeyboard<'d> {
    /// Create a new keyboard sink from the given HID writer.
    pub fn new(writer: KeyboardWriter<'d>) -> Self {
        Self {
            writer,
            ready: false,
        }
    }
}

impl<'d> ReportWriter for UsbKeyboard<'d> {
    async fn write_report(&mut self, report: &[u8; REPORT_LEN]) -> Result<(), EmitError> {
        if !self.ready {
            self.wait_ready().await;
        }
        self.writer.write(report).await.map_err(|e| match e {
            EndpointError::Disabled => {
                self.ready = false;
                EmitError::NotReady
            }
            _ => EmitError::Io,
        })
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    /// Wait until the endpoint is enabled (enumerated, or back from a reset).
    async fn wait_ready(&mut self) {
        self.writer.ready().await;
        self.ready = true;
    }
}

/// HID request handler.
///
/// The host sends the keyboard LED state as an output report; it is
/// only logged.
pub struct KeyboardRequestHandler;

impl RequestHandler for KeyboardRequestHandler {
    fn get_report(&mut self, _id: ReportId, _buf: &mut [u8]) -> Option<usize> {
        None
    }

    fn set_report(&mut self, id: ReportId, data: &[u8]) -> OutResponse {
        debug!("host set report {:?}: {=[u8]:x}", id, data);
        OutResponse::Accepted
    }

    fn set_idle_ms(&mut self, id: Option<ReportId>, duration_ms: u32) {
        info!("host set idle {:?} to {} ms", id, duration_ms);
    }

    fn get_idle_ms(&mut self, _id: Option<ReportId>) -> Option<u32> {
        None
    }
}

/// Configure the USB HID keyboard class in the USB builder.
///
/// Returns the HID writer for use by the application.
pub fn configure_usb_hid<'d>(
    builder: &mut Builder<'d, Driver<'d, USB>>,
    state: &'d mut State<'d>,
    handler: &'d mut KeyboardRequestHandler,
) -> KeyboardWriter<'d> {
    let config = embassy_usb::class::hid::Config {
        report_descriptor: KeyboardReport::desc(),
        request_handler: Some(handler),
        poll_ms: 1,
        max_packet_size: REPORT_LEN as u16,
        hid_subclass: embassy_usb::class::hid::HidSubclass::Boot,
        hid_boot_protocol: embassy_usb::class::hid::HidBootProtocol::Keyboard,
    };

    HidWriter::new(builder, state, config)
}
