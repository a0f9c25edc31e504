#![no_std]
#![no_main]

use defmt::info;
use defmt_rtt as _;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::Output;
use embassy_rp::i2c_slave::{Config as I2cTargetConfig, I2cSlave};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::I2C0;
use embassy_time::{Duration, Ticker};
use keybus_core::config::{ENCODER_CONFIGS, QUEUE_CAPACITY};
use keybus_peripheral_rp2040::pins::{button, encoder, mode_led};
use keybus_peripheral_rp2040::{
    now, serve, BusResponder, EncoderMode, EventQueue, NodePins, PeripheralScanner, Producer, ScanSample,
    BUS_ADDRESS,
};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    I2C0_IRQ => embassy_rp::i2c::InterruptHandler<I2C0>;
});

/// Events waiting for the aggregator.
static QUEUE: StaticCell<EventQueue<QUEUE_CAPACITY>> = StaticCell::new();

/// Runs the bus responder above the scanner's priority.
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_HIGH.on_interrupt()
}

/// Pin sampling period.
const SCAN_PERIOD: Duration = Duration::from_millis(1);

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("keybus peripheral starting at address {=u8:#x}...", BUS_ADDRESS);

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    let queue = QUEUE.init(EventQueue::new());
    let (producer, consumer) = queue.split();

    // --- Inputs ---
    let pins = NodePins {
        buttons: [
            button(p.PIN_2),
            button(p.PIN_3),
            button(p.PIN_4),
            button(p.PIN_5),
            button(p.PIN_6),
        ],
        encoders: [
            encoder(p.PIN_8, p.PIN_9, p.PIN_7),
            encoder(p.PIN_11, p.PIN_12, p.PIN_10),
        ],
    };

    // Mode LED (on-board LED on Pico)
    let led = Output::new(p.PIN_25, mode_led(EncoderMode::A));

    // --- I2C target ---
    let mut i2c_config = I2cTargetConfig::default();
    i2c_config.addr = u16::from(BUS_ADDRESS);
    let i2c = I2cSlave::new(
        p.I2C0,
        p.PIN_21, // SCL
        p.PIN_20, // SDA
        Irqs,
        i2c_config,
    );

    // Responder preempts the scanner
    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let high_spawner = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    high_spawner.spawn(responder_task(i2c, BusResponder::new(consumer)).unwrap());

    spawner.spawn(scan_task(pins, producer, led).unwrap());

    info!("keybus peripheral initialized");
}

/// Responder task - answers every aggregator read from the queue.
#[embassy_executor::task]
async fn responder_task(
    i2c: I2cSlave<'static, I2C0>,
    responder: BusResponder<'static, QUEUE_CAPACITY>,
) {
    serve(i2c, responder).await
}

/// Scan task - samples all inputs and queues the resulting events.
#[embassy_executor::task]
async fn scan_task(
    mut pins: NodePins,
    mut producer: Producer<'static, QUEUE_CAPACITY>,
    mut led: Output<'static>,
) {
    let initial = pins.sample(&ScanSample::IDLE);
    let mut scanner = PeripheralScanner::new(initial, ENCODER_CONFIGS, now());
    let mut ticker = Ticker::every(SCAN_PERIOD);

    loop {
        ticker.next().await;
        let report = scanner.scan_pins(&mut pins, now(), &mut producer);
        if let Some((0, mode)) = report.mode_change {
            led.set_level(mode_led(mode));
        }
    }
}
