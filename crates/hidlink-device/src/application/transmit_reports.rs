//! Use case: present queued reports to the PC through the USB device stack.
//!
//! One pass of the submit loop (a *tick*):
//!
//! 1. pump the stack so it can service bus events,
//! 2. hand OUTPUT reports the PC pushed down since the last pass to the
//!    control handler,
//! 3. if the keyboard interface is ready, dequeue at most one keyboard
//!    report and submit it,
//! 4. the same for the mouse interface,
//!
//! then yield for about a millisecond. Readiness is checked *before*
//! dequeuing, so a busy interface leaves reports queued rather than pulling
//! them out to die. A report that fails to submit is discarded with a
//! warning, not retried; the next queued report carries newer state anyway.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hidlink_core::queue::ReportQueue;
use hidlink_core::{KeyboardReport, LinkWrite, MouseReport};
use thiserror::Error;
use tracing::{info, warn};

use super::handle_control::ControlHandler;

/// How long one tick yields before the next pass.
const TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Error type for report submission.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The interface reported ready but refused the transfer.
    #[error("interface busy")]
    Busy,
    /// The stack rejected the report outright.
    #[error("report rejected: {0}")]
    Rejected(String),
}

/// An OUTPUT report the PC delivered through a control transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputReport {
    /// Interface the transfer addressed.
    pub interface: u8,
    /// HID report type from the request; 2 is OUTPUT.
    pub report_type: u8,
    /// Raw report payload.
    pub data: Vec<u8>,
}

/// The USB device stack as the submit loop sees it.
///
/// A hardware backend wraps a composite keyboard-and-mouse device port;
/// the mock in the infrastructure layer scripts readiness and records
/// submissions instead.
pub trait HidDeviceStack: Send + Sync {
    /// Services the stack. Called once per tick, before anything else.
    fn pump(&self);

    /// True when the keyboard interface can accept a report.
    fn keyboard_ready(&self) -> bool;

    /// True when the mouse interface can accept a report.
    fn mouse_ready(&self) -> bool;

    /// Submits one keyboard report to the PC.
    fn submit_keyboard(&self, report: &KeyboardReport) -> Result<(), SubmitError>;

    /// Submits one mouse report to the PC.
    fn submit_mouse(&self, report: &MouseReport) -> Result<(), SubmitError>;

    /// Drains the OUTPUT reports the PC delivered since the last call.
    fn take_output_reports(&self) -> Vec<OutputReport>;
}

/// The submit loop: report queues in, USB transfers out.
pub struct ReportTransmitter<W: LinkWrite> {
    stack: Arc<dyn HidDeviceStack>,
    keyboard_queue: Arc<ReportQueue<KeyboardReport>>,
    mouse_queue: Arc<ReportQueue<MouseReport>>,
    control: ControlHandler<W>,
}

impl<W: LinkWrite> ReportTransmitter<W> {
    pub fn new(
        stack: Arc<dyn HidDeviceStack>,
        keyboard_queue: Arc<ReportQueue<KeyboardReport>>,
        mouse_queue: Arc<ReportQueue<MouseReport>>,
        control: ControlHandler<W>,
    ) -> Self {
        Self {
            stack,
            keyboard_queue,
            mouse_queue,
            control,
        }
    }

    /// One pass of the submit loop, broken out so tests can drive it
    /// without the timer.
    pub fn tick(&self) {
        self.stack.pump();

        for output in self.stack.take_output_reports() {
            self.control
                .set_report(output.interface, output.report_type, &output.data);
        }

        if self.stack.keyboard_ready() {
            if let Some(report) = self.keyboard_queue.try_dequeue() {
                if let Err(e) = self.stack.submit_keyboard(&report) {
                    warn!("keyboard report discarded: {e}");
                }
            }
        }

        if self.stack.mouse_ready() {
            if let Some(report) = self.mouse_queue.try_dequeue() {
                if let Err(e) = self.stack.submit_mouse(&report) {
                    warn!("mouse report discarded: {e}");
                }
            }
        }
    }

    /// Runs ticks until `running` is cleared.
    pub async fn run(&self, running: &AtomicBool) {
        while running.load(Ordering::Relaxed) {
            self.tick();
            tokio::time::sleep(TICK_INTERVAL).await;
        }
        info!("report transmitter stopped");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use hidlink_core::{recv_frame, Deadline, FrameKind, FrameSender, MemoryLink, ModifierFlags};
    use std::sync::atomic::AtomicU32;
    use std::sync::Mutex;

    // ── Mock stack ────────────────────────────────────────────────────────────

    #[derive(Default)]
    struct RecordingStack {
        keyboard_ready: AtomicBool,
        mouse_ready: AtomicBool,
        keyboard_submissions: Mutex<Vec<KeyboardReport>>,
        mouse_submissions: Mutex<Vec<MouseReport>>,
        pending_outputs: Mutex<Vec<OutputReport>>,
        pumps: AtomicU32,
        should_fail: bool,
    }

    impl HidDeviceStack for RecordingStack {
        fn pump(&self) {
            self.pumps.fetch_add(1, Ordering::Relaxed);
        }

        fn keyboard_ready(&self) -> bool {
            self.keyboard_ready.load(Ordering::Relaxed)
        }

        fn mouse_ready(&self) -> bool {
            self.mouse_ready.load(Ordering::Relaxed)
        }

        fn submit_keyboard(&self, report: &KeyboardReport) -> Result<(), SubmitError> {
            if self.should_fail {
                return Err(SubmitError::Rejected("injected failure".to_string()));
            }
            self.keyboard_submissions.lock().unwrap().push(*report);
            Ok(())
        }

        fn submit_mouse(&self, report: &MouseReport) -> Result<(), SubmitError> {
            if self.should_fail {
                return Err(SubmitError::Rejected("injected failure".to_string()));
            }
            self.mouse_submissions.lock().unwrap().push(*report);
            Ok(())
        }

        fn take_output_reports(&self) -> Vec<OutputReport> {
            std::mem::take(&mut *self.pending_outputs.lock().unwrap())
        }
    }

    struct Rig {
        transmitter: ReportTransmitter<MemoryLink>,
        upstream: MemoryLink,
        keyboard_queue: Arc<ReportQueue<KeyboardReport>>,
        mouse_queue: Arc<ReportQueue<MouseReport>>,
    }

    fn make_rig(stack: Arc<RecordingStack>) -> Rig {
        let (upstream_tx, upstream_rx) = MemoryLink::pair();
        let keyboard_queue = Arc::new(ReportQueue::with_capacity(8));
        let mouse_queue = Arc::new(ReportQueue::with_capacity(8));
        let transmitter = ReportTransmitter::new(
            stack as Arc<dyn HidDeviceStack>,
            Arc::clone(&keyboard_queue),
            Arc::clone(&mouse_queue),
            ControlHandler::new(Arc::new(FrameSender::new(upstream_tx))),
        );
        Rig {
            transmitter,
            upstream: upstream_rx,
            keyboard_queue,
            mouse_queue,
        }
    }

    fn keyboard_report(key: u8) -> KeyboardReport {
        KeyboardReport {
            modifiers: ModifierFlags(0),
            reserved: 0,
            keys: [key, 0, 0, 0, 0, 0],
        }
    }

    fn mouse_report(dx: i8) -> MouseReport {
        MouseReport {
            buttons: 0,
            dx,
            dy: 0,
            wheel: 0,
            pan: 0,
        }
    }

    // ── Gated submission ──────────────────────────────────────────────────────

    #[test]
    fn test_ready_keyboard_submits_one_report_per_tick() {
        // Arrange
        let stack = Arc::new(RecordingStack::default());
        stack.keyboard_ready.store(true, Ordering::Relaxed);
        let rig = make_rig(Arc::clone(&stack));
        rig.keyboard_queue.enqueue(keyboard_report(0x04));
        rig.keyboard_queue.enqueue(keyboard_report(0x05));

        // Act
        rig.transmitter.tick();

        // Assert – one submitted, one still queued
        assert_eq!(
            *stack.keyboard_submissions.lock().unwrap(),
            vec![keyboard_report(0x04)]
        );
        assert_eq!(rig.keyboard_queue.len(), 1);
    }

    #[test]
    fn test_busy_keyboard_leaves_reports_queued() {
        // Arrange – keyboard interface never becomes ready
        let stack = Arc::new(RecordingStack::default());
        let rig = make_rig(Arc::clone(&stack));
        rig.keyboard_queue.enqueue(keyboard_report(0x04));

        // Act
        rig.transmitter.tick();
        rig.transmitter.tick();

        // Assert
        assert!(stack.keyboard_submissions.lock().unwrap().is_empty());
        assert_eq!(rig.keyboard_queue.len(), 1);
    }

    #[test]
    fn test_keyboard_and_mouse_interfaces_are_independent() {
        // Arrange – only the mouse is ready
        let stack = Arc::new(RecordingStack::default());
        stack.mouse_ready.store(true, Ordering::Relaxed);
        let rig = make_rig(Arc::clone(&stack));
        rig.keyboard_queue.enqueue(keyboard_report(0x04));
        rig.mouse_queue.enqueue(mouse_report(5));

        // Act
        rig.transmitter.tick();

        // Assert
        assert!(stack.keyboard_submissions.lock().unwrap().is_empty());
        assert_eq!(*stack.mouse_submissions.lock().unwrap(), vec![mouse_report(5)]);
        assert_eq!(rig.keyboard_queue.len(), 1);
        assert!(rig.mouse_queue.is_empty());
    }

    #[test]
    fn test_failed_submit_discards_the_report() {
        // Arrange
        let stack = Arc::new(RecordingStack {
            should_fail: true,
            ..Default::default()
        });
        stack.keyboard_ready.store(true, Ordering::Relaxed);
        let rig = make_rig(Arc::clone(&stack));
        rig.keyboard_queue.enqueue(keyboard_report(0x04));

        // Act
        rig.transmitter.tick();

        // Assert – the report is gone, not requeued
        assert!(stack.keyboard_submissions.lock().unwrap().is_empty());
        assert!(rig.keyboard_queue.is_empty());
    }

    // ── Control plumbing ──────────────────────────────────────────────────────

    #[test]
    fn test_output_reports_are_routed_through_the_control_handler() {
        // Arrange – the PC pushed an LED OUTPUT report down
        let stack = Arc::new(RecordingStack::default());
        stack.pending_outputs.lock().unwrap().push(OutputReport {
            interface: 0,
            report_type: 2,
            data: vec![0x03],
        });
        let mut rig = make_rig(Arc::clone(&stack));

        // Act
        rig.transmitter.tick();

        // Assert – the LED frame went upstream and the pending list drained
        let frame = recv_frame(&mut rig.upstream, Deadline::after(Duration::from_secs(1)))
            .expect("LED frame should arrive");
        assert_eq!(frame.kind(), FrameKind::LedUpdate);
        assert_eq!(frame.payload(), &[0x03]);
        assert!(stack.take_output_reports().is_empty());
    }

    #[test]
    fn test_pump_runs_on_every_tick() {
        // Arrange
        let stack = Arc::new(RecordingStack::default());
        let rig = make_rig(Arc::clone(&stack));

        // Act
        rig.transmitter.tick();
        rig.transmitter.tick();
        rig.transmitter.tick();

        // Assert
        assert_eq!(stack.pumps.load(Ordering::Relaxed), 3);
    }

    // ── Run loop ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_run_exits_when_the_flag_is_cleared() {
        // Arrange
        let stack = Arc::new(RecordingStack::default());
        let rig = make_rig(Arc::clone(&stack));
        let running = Arc::new(AtomicBool::new(true));

        // Act
        let handle = {
            let running = Arc::clone(&running);
            let transmitter = rig.transmitter;
            tokio::spawn(async move { transmitter.run(&running).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        running.store(false, Ordering::Relaxed);
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("transmitter should stop")
            .expect("transmitter task panicked");

        // Assert – the loop pumped while it ran
        assert!(stack.pumps.load(Ordering::Relaxed) > 0);
    }
}
