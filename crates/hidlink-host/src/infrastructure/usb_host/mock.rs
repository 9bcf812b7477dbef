//! Mock report source for unit testing and headless runs.
//!
//! Allows tests to inject synthetic [`ReportEvent`]s without requiring a
//! USB host controller, and records any LED state applied through the
//! [`LedSink`] seam.

use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex,
};

use hidlink_core::LedState;
use tracing::debug;

use crate::application::led_feedback::LedSink;

use super::{ReportEvent, ReportSource, SourceError};

/// A mock implementation of [`ReportSource`] that allows tests to inject events.
pub struct MockReportSource {
    sender: Arc<Mutex<Option<Sender<ReportEvent>>>>,
    led_states: Arc<Mutex<Vec<LedState>>>,
}

impl MockReportSource {
    /// Creates a new mock report source.
    pub fn new() -> Self {
        Self {
            sender: Arc::new(Mutex::new(None)),
            led_states: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Injects a synthetic event, as if captured from hardware.
    ///
    /// Panics if `start()` has not been called or if `stop()` has been called.
    pub fn inject_event(&self, event: ReportEvent) {
        let guard = self.sender.lock().expect("lock poisoned");
        if let Some(ref sender) = *guard {
            sender
                .send(event)
                .expect("receiver has been dropped; call start() first");
        } else {
            panic!("MockReportSource::inject_event called before start()");
        }
    }

    /// Injects a keyboard report with the given bytes.
    pub fn inject_keyboard(&self, report: &[u8]) {
        self.inject_event(ReportEvent::Keyboard {
            report: report.to_vec(),
        });
    }

    /// Injects a mouse report with the given bytes.
    pub fn inject_mouse(&self, report: &[u8]) {
        self.inject_event(ReportEvent::Mouse {
            report: report.to_vec(),
        });
    }

    /// Returns every LED state applied via [`LedSink::set_leds`], oldest first.
    pub fn led_states(&self) -> Vec<LedState> {
        self.led_states.lock().expect("lock poisoned").clone()
    }
}

impl Default for MockReportSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportSource for MockReportSource {
    fn start(&self) -> Result<mpsc::Receiver<ReportEvent>, SourceError> {
        let (tx, rx) = mpsc::channel();
        *self.sender.lock().expect("lock poisoned") = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        // Drop the sender to close the channel
        *self.sender.lock().expect("lock poisoned") = None;
    }
}

impl LedSink for MockReportSource {
    fn set_leds(&self, state: LedState) {
        debug!("mock sink: keyboard LEDs set to {:#04x}", state.0);
        self.led_states.lock().expect("lock poisoned").push(state);
    }
}
