//! HidLink host node entry point.
//!
//! Wires together the USB report source, the serial link, and the two
//! application loops, then parks on the Tokio runtime until Ctrl-C.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()          -- TOML from the platform config dir
//!  └─ SerialLink::open()     -- one port, cloned into RX and TX halves
//!  └─ start services
//!       ├─ ReportForwarder   (thread: USB events → frames out)
//!       └─ run_led_feedback  (thread: frames in → keyboard LEDs)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use hidlink_core::{FrameSender, SerialLink};
use hidlink_host::application::forward_reports::ReportForwarder;
use hidlink_host::application::led_feedback;
use hidlink_host::infrastructure::storage::config;
use hidlink_host::infrastructure::usb_host::mock::MockReportSource;
use hidlink_host::infrastructure::usb_host::ReportSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Config first so its log level can seed the filter below.
    let cfg = match config::load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("failed to load config, using defaults: {e}");
            config::HostConfig::default()
        }
    };

    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cfg.log_level.clone())),
        )
        .init();

    info!("HidLink host starting");

    // One serial port, cloned into independent read and write halves.
    let (mut link_rx, link_tx) = SerialLink::open(&cfg.link)
        .with_context(|| format!("opening serial link on {}", cfg.link.port_path()))?;

    let running = Arc::new(AtomicBool::new(true));

    // USB host backend.  The mock source stands in for hardware here; a
    // physical host-controller backend slots in behind the same trait.
    let source = Arc::new(MockReportSource::new());
    let events = source.start().context("starting report source")?;

    let forwarder = ReportForwarder::new(Arc::new(FrameSender::new(link_tx)));
    forwarder.on_status("host node online");

    // ── Report forwarder ──────────────────────────────────────────────────────
    let running_fwd = Arc::clone(&running);
    let forward_handle = std::thread::spawn(move || {
        forwarder.run(events, &running_fwd);
    });

    // ── LED feedback ──────────────────────────────────────────────────────────
    let led_sink = Arc::clone(&source);
    let running_led = Arc::clone(&running);
    let led_handle = std::thread::spawn(move || {
        led_feedback::run_led_feedback(&mut link_rx, led_sink.as_ref(), &running_led);
    });

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    info!("HidLink host ready.  Press Ctrl-C to exit.");

    loop {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if !running.load(Ordering::Relaxed) {
            break;
        }
    }

    source.stop();
    if forward_handle.join().is_err() {
        error!("forwarder thread panicked");
    }
    if led_handle.join().is_err() {
        error!("LED feedback thread panicked");
    }

    info!("HidLink host stopped");
    Ok(())
}
