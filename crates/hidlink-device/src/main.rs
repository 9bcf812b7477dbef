//! HidLink device node entry point.
//!
//! Wires together the serial link, the key filter, the report queues, and
//! the USB device stack, then parks on the Tokio runtime until Ctrl-C.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()          -- TOML from the platform config dir
//!  └─ SerialLink::open()     -- one port, cloned into RX and TX halves
//!  └─ start services
//!       ├─ FrameReceiver     (thread: frames in → filter → queues)
//!       └─ ReportTransmitter (task: queues → USB submits, LEDs back out)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use hidlink_core::queue::ReportQueue;
use hidlink_core::{FrameSender, SerialLink};
use hidlink_device::application::filter_keys::KeyFilter;
use hidlink_device::application::handle_control::ControlHandler;
use hidlink_device::application::receive_frames::FrameReceiver;
use hidlink_device::application::transmit_reports::{HidDeviceStack, ReportTransmitter};
use hidlink_device::infrastructure::storage::config;
use hidlink_device::infrastructure::usb::mock::MockDeviceStack;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Config first so its log level can seed the filter below.
    let cfg = match config::load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("failed to load config, using defaults: {e}");
            config::DeviceConfig::default()
        }
    };

    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cfg.log_level.clone())),
        )
        .init();

    info!("HidLink device starting");

    // One serial port, cloned into independent read and write halves.
    let (mut link_rx, link_tx) = SerialLink::open(&cfg.link)
        .with_context(|| format!("opening serial link on {}", cfg.link.port_path()))?;

    let running = Arc::new(AtomicBool::new(true));

    let keyboard_queue = Arc::new(ReportQueue::with_capacity(cfg.queue_capacity));
    let mouse_queue = Arc::new(ReportQueue::with_capacity(cfg.queue_capacity));

    // USB device backend.  The mock stack stands in for hardware here; a
    // UDC-backed stack slots in behind the same trait.
    let stack: Arc<dyn HidDeviceStack> = Arc::new(MockDeviceStack::ready());

    // ── Frame receiver ────────────────────────────────────────────────────────
    let mut receiver = FrameReceiver::new(
        KeyFilter::new(),
        Arc::clone(&keyboard_queue),
        Arc::clone(&mouse_queue),
    );
    let running_rx = Arc::clone(&running);
    let receive_handle = std::thread::spawn(move || {
        receiver.run(&mut link_rx, &running_rx);
    });

    // ── Report transmitter ────────────────────────────────────────────────────
    let transmitter = ReportTransmitter::new(
        stack,
        keyboard_queue,
        mouse_queue,
        ControlHandler::new(Arc::new(FrameSender::new(link_tx))),
    );
    let running_tx = Arc::clone(&running);
    let transmit_handle = tokio::spawn(async move {
        transmitter.run(&running_tx).await;
    });

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    info!("HidLink device ready.  Press Ctrl-C to exit.");

    loop {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if !running.load(Ordering::Relaxed) {
            break;
        }
    }

    if receive_handle.join().is_err() {
        error!("receiver thread panicked");
    }
    if transmit_handle.await.is_err() {
        error!("transmitter task panicked");
    }

    info!("HidLink device stopped");
    Ok(())
}
