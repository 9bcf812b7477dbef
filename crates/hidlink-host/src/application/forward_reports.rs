//! ReportForwarder: forwards captured HID reports to the device node.
//!
//! This use case is the heart of the host application. It receives raw HID
//! reports from the USB host infrastructure, validates their boot-protocol
//! shape, and submits them to the shared [`FrameSender`] for transmission
//! over the serial link.
//!
//! # Failure policy
//!
//! Every failure here is log-and-drop: a report that cannot be sent is
//! discarded, never retried and never buffered. HID input is a stream of
//! absolute states, so the next report supersedes a lost one, and blocking
//! the USB stack to preserve a stale report would only add latency.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use hidlink_core::report::{KEYBOARD_REPORT_LEN, MOUSE_REPORT_MAX_LEN, MOUSE_REPORT_MIN_LEN};
use hidlink_core::{FrameKind, FrameSender, LinkWrite, MAX_PAYLOAD};
use tracing::{info, warn};

use crate::infrastructure::usb_host::ReportEvent;

/// How long [`ReportForwarder::run`] waits for an event before rechecking
/// the shutdown flag.
const EVENT_POLL: Duration = Duration::from_millis(200);

/// Forwards HID report events to the device node as frames.
pub struct ReportForwarder<W: LinkWrite> {
    sender: Arc<FrameSender<W>>,
}

impl<W: LinkWrite> ReportForwarder<W> {
    /// Creates a forwarder submitting frames through `sender`.
    pub fn new(sender: Arc<FrameSender<W>>) -> Self {
        Self { sender }
    }

    /// Drains `events` until the channel closes or `running` is cleared.
    pub fn run(&self, events: mpsc::Receiver<ReportEvent>, running: &AtomicBool) {
        while running.load(Ordering::Relaxed) {
            match events.recv_timeout(EVENT_POLL) {
                Ok(event) => self.handle_event(event),
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    info!("report source closed, forwarder exiting");
                    break;
                }
            }
        }
    }

    /// Dispatches a single event from the USB side.
    pub fn handle_event(&self, event: ReportEvent) {
        match event {
            ReportEvent::Keyboard { report } => self.on_keyboard_report(&report),
            ReportEvent::Mouse { report } => self.on_mouse_report(&report),
            ReportEvent::Connected {
                vendor_id,
                product_id,
                protocol,
            } => {
                info!("HID device connected: {vendor_id:04x}:{product_id:04x} (boot protocol {protocol})");
                self.on_status(&format!("connected {vendor_id:04x}:{product_id:04x}"));
            }
            ReportEvent::Disconnected {
                vendor_id,
                product_id,
            } => {
                info!("HID device disconnected: {vendor_id:04x}:{product_id:04x}");
                self.on_status(&format!("disconnected {vendor_id:04x}:{product_id:04x}"));
            }
        }
    }

    /// Forwards a keyboard input report. Boot keyboards produce exactly
    /// 8 bytes; anything else is dropped.
    pub fn on_keyboard_report(&self, report: &[u8]) {
        if report.len() != KEYBOARD_REPORT_LEN {
            warn!(
                "unexpected keyboard report length {} (want {KEYBOARD_REPORT_LEN}), dropping",
                report.len()
            );
            return;
        }
        self.send(FrameKind::KeyboardReport, report);
    }

    /// Forwards a mouse input report. Boot mice produce 3 to 5 bytes; the
    /// length is preserved on the wire and the device node zero-pads.
    pub fn on_mouse_report(&self, report: &[u8]) {
        if !(MOUSE_REPORT_MIN_LEN..=MOUSE_REPORT_MAX_LEN).contains(&report.len()) {
            warn!(
                "unexpected mouse report length {} (want {MOUSE_REPORT_MIN_LEN}..={MOUSE_REPORT_MAX_LEN}), dropping",
                report.len()
            );
            return;
        }
        self.send(FrameKind::MouseReport, report);
    }

    /// Sends free-form status text to the device node, truncated to
    /// `MAX_PAYLOAD` bytes on a UTF-8 character boundary.
    pub fn on_status(&self, text: &str) {
        let mut end = text.len().min(MAX_PAYLOAD);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        self.send(FrameKind::Status, &text.as_bytes()[..end]);
    }

    fn send(&self, kind: FrameKind, payload: &[u8]) {
        if let Err(e) = self.sender.send(kind, payload) {
            warn!("dropping {kind:?} frame: {e}");
        }
    }
}
