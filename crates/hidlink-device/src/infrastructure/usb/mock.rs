//! Mock USB device stack for unit testing.
//!
//! # Why a mock stack?
//!
//! A real `HidDeviceStack` backend drives a UDC-capable USB port, which:
//!
//! - Requires hardware most development machines do not have (they are
//!   USB hosts, not devices).
//! - Actually types keys and moves the pointer on whatever PC the port
//!   is plugged into.
//! - Cannot be observed directly from Rust test code.
//!
//! The `MockDeviceStack` replaces the port with in-memory recording. Each
//! submitted report is pushed into a `Mutex<Vec<...>>` so assertions can
//! inspect exactly what was submitted and in what order, and readiness is
//! scripted through atomics so a test can toggle it mid-run through the
//! `Arc` the submit loop holds.
//!
//! # Usage in tests
//!
//! ```ignore
//! let stack = Arc::new(MockDeviceStack::ready());
//! let transmitter = ReportTransmitter::new(Arc::clone(&stack) as _, kb, mouse, control);
//!
//! transmitter.tick();
//!
//! let submitted = stack.keyboard_submissions.lock().unwrap();
//! assert_eq!(submitted.len(), 1);
//! ```
//!
//! # `should_fail` flag
//!
//! Set `should_fail = true` before sharing the stack to make every submit
//! return `SubmitError::Busy`, which exercises the discard path in the
//! submit loop.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use hidlink_core::{KeyboardReport, MouseReport};

use crate::application::transmit_reports::{HidDeviceStack, OutputReport, SubmitError};

/// A mock stack that records submissions without touching a USB port.
///
/// All records live in `Mutex<Vec<...>>` fields so tests can share the
/// stack across threads through an `Arc`.
#[derive(Default)]
pub struct MockDeviceStack {
    /// Scripted result of `keyboard_ready`.
    pub keyboard_ready: AtomicBool,
    /// Scripted result of `mouse_ready`.
    pub mouse_ready: AtomicBool,
    /// Records every report passed to `submit_keyboard`.
    pub keyboard_submissions: Mutex<Vec<KeyboardReport>>,
    /// Records every report passed to `submit_mouse`.
    pub mouse_submissions: Mutex<Vec<MouseReport>>,
    /// OUTPUT reports handed out by the next `take_output_reports` call.
    pub pending_outputs: Mutex<Vec<OutputReport>>,
    /// Counts `pump` calls.
    pub pumps: AtomicU32,
    /// When `true`, both submit methods return `SubmitError::Busy`.
    pub should_fail: bool,
}

impl MockDeviceStack {
    /// Creates a stack with both interfaces not ready and empty records.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stack with both interfaces ready, the common test posture.
    pub fn ready() -> Self {
        let stack = Self::default();
        stack.keyboard_ready.store(true, Ordering::Relaxed);
        stack.mouse_ready.store(true, Ordering::Relaxed);
        stack
    }

    /// Queues an OUTPUT report for the next `take_output_reports` drain,
    /// as if the PC had pushed one down a control transfer.
    pub fn push_output_report(&self, interface: u8, report_type: u8, data: &[u8]) {
        self.pending_outputs.lock().unwrap().push(OutputReport {
            interface,
            report_type,
            data: data.to_vec(),
        });
    }
}

impl HidDeviceStack for MockDeviceStack {
    /// Counts the call; the mock has no bus to service.
    fn pump(&self) {
        self.pumps.fetch_add(1, Ordering::Relaxed);
    }

    fn keyboard_ready(&self) -> bool {
        self.keyboard_ready.load(Ordering::Relaxed)
    }

    fn mouse_ready(&self) -> bool {
        self.mouse_ready.load(Ordering::Relaxed)
    }

    /// Records the report, or returns `Busy` if `should_fail` is set.
    fn submit_keyboard(&self, report: &KeyboardReport) -> Result<(), SubmitError> {
        if self.should_fail {
            return Err(SubmitError::Busy);
        }
        self.keyboard_submissions.lock().unwrap().push(*report);
        Ok(())
    }

    /// Records the report, or returns `Busy` if `should_fail` is set.
    fn submit_mouse(&self, report: &MouseReport) -> Result<(), SubmitError> {
        if self.should_fail {
            return Err(SubmitError::Busy);
        }
        self.mouse_submissions.lock().unwrap().push(*report);
        Ok(())
    }

    fn take_output_reports(&self) -> Vec<OutputReport> {
        std::mem::take(&mut *self.pending_outputs.lock().unwrap())
    }
}
