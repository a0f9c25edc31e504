#![no_std]
#![no_main]

use defmt::info;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::i2c::{Async, Config as I2cConfig, I2c};
use embassy_rp::peripherals::{I2C0, USB};
use embassy_rp::usb::Driver;
use embassy_time::{Duration, Ticker};
use embassy_usb::class::hid::State;
use embassy_usb::{Builder, Config as UsbConfig};
use keybus_aggregator_rp2040::config::{DEFAULT_DEVICES, DEVICE_COUNT, POLL_INTERVAL};
use keybus_aggregator_rp2040::{
    configure_usb_hid, Aggregator, I2cTransport, KeyEmitter, KeyboardRequestHandler, ReportEmitter,
    TimedBus, UsbKeyboard, READ_TIMEOUT,
};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    I2C0_IRQ => embassy_rp::i2c::InterruptHandler<I2C0>;
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
});

type Poller = Aggregator<
    TimedBus<I2cTransport<I2c<'static, I2C0, Async>>>,
    ReportEmitter<UsbKeyboard<'static>>,
    DEVICE_COUNT,
>;

/// USB device configuration buffer.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// HID state.
static HID_STATE: StaticCell<State> = StaticCell::new();
static HID_HANDLER: StaticCell<KeyboardRequestHandler> = StaticCell::new();

/// Poll cycles between statistics log lines (10 s at the default interval).
const STATS_EVERY: u32 = 200;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("keybus aggregator starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- I2C Setup ---
    let mut i2c_config = I2cConfig::default();
    i2c_config.frequency = 100_000;

    let i2c = I2c::new_async(
        p.I2C0,
        p.PIN_21, // SCL
        p.PIN_20, // SDA
        Irqs,
        i2c_config,
    );
    let bus = TimedBus::new(I2cTransport::new(i2c), READ_TIMEOUT);

    // --- USB Setup ---
    let usb_driver = Driver::new(p.USB, Irqs);

    let mut usb_config = UsbConfig::new(0x1209, 0x0001); // pid.codes test VID/PID
    usb_config.manufacturer = Some("keybus");
    usb_config.product = Some("keybus Aggregator");
    usb_config.serial_number = Some("001");
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;

    let config_descriptor = CONFIG_DESCRIPTOR.init([0; 256]);
    let bos_descriptor = BOS_DESCRIPTOR.init([0; 256]);
    let msos_descriptor = MSOS_DESCRIPTOR.init([0; 256]);
    let control_buf = CONTROL_BUF.init([0; 64]);

    let mut builder = Builder::new(
        usb_driver,
        usb_config,
        config_descriptor,
        bos_descriptor,
        msos_descriptor,
        control_buf,
    );

    // Configure HID keyboard class
    let hid_state = HID_STATE.init(State::new());
    let hid_handler = HID_HANDLER.init(KeyboardRequestHandler);
    let hid_writer = configure_usb_hid(&mut builder, hid_state, hid_handler);

    // Build the USB device
    let usb_device = builder.build();

    let emitter = ReportEmitter::new(UsbKeyboard::new(hid_writer));
    let poller = Aggregator::new(bus, emitter, DEFAULT_DEVICES);

    // LED for error indication (on-board LED on Pico)
    let led = Output::new(p.PIN_25, Level::Low);

    // Spawn tasks (unwrap the SpawnToken, then spawn)
    spawner.spawn(usb_task(usb_device).unwrap());
    spawner.spawn(poll_task(poller, led).unwrap());

    info!("keybus aggregator initialized, polling {} devices", DEVICE_COUNT);
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: embassy_usb::UsbDevice<'static, Driver<'static, USB>>) {
    device.run().await;
}

/// Poll task - asks every peripheral for one event per interval.
#[embassy_executor::task]
async fn poll_task(mut poller: Poller, mut led: Output<'static>) {
    // Wait for USB to be ready
    poller.emitter_mut().wait_ready().await;
    info!("USB HID ready, polling peripherals...");

    let mut ticker = Ticker::every(Duration::from_millis(u64::from(POLL_INTERVAL.to_millis())));
    loop {
        ticker.next().await;

        // Waits out USB resets and releases held keys when every device is lost
        let summary = poller.poll_cycle().await;
        if summary.failed > 0 {
            // Toggle LED to indicate error
            led.toggle();
        }

        let stats = poller.stats();
        if stats.cycles % STATS_EVERY == 0 {
            info!("poll stats: {:?}", stats);
        }
    }
}
