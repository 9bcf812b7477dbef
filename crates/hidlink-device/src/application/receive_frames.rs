//! Use case: decode frames off the serial link and queue reports for USB.
//!
//! The receive loop runs on a dedicated thread and owns the read half of
//! the link. Every keyboard report passes through the [`KeyFilter`] before
//! it is queued; swallowed reports never reach the PC. A decode error
//! discards the bytes in question and the loop keeps reading, so a corrupt
//! frame costs its own payload, not the session. Only a closed link or the
//! shutdown flag stops the loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use hidlink_core::queue::ReportQueue;
use hidlink_core::{
    recv_frame, Deadline, Frame, FrameError, FrameKind, KeyboardReport, LinkRead, MouseReport,
};
use tracing::{debug, info, warn};

use super::filter_keys::{FilterAction, KeyFilter};

/// Per-read deadline. Finite so the loop re-checks the shutdown flag even
/// on a silent link.
const RECV_DEADLINE: Duration = Duration::from_millis(500);

/// Minimum spacing between decode-error warnings.
const DECODE_WARN_INTERVAL: Duration = Duration::from_secs(1);

/// Caps decode-error warnings at one per [`DECODE_WARN_INTERVAL`], counting
/// what it suppresses. A noisy line can produce hundreds of errors per
/// second and the log must stay readable.
struct WarnThrottle {
    last: Option<Instant>,
    suppressed: u32,
}

impl WarnThrottle {
    fn new() -> Self {
        Self {
            last: None,
            suppressed: 0,
        }
    }

    /// True when the caller should log this event; otherwise it is counted.
    fn should_log(&mut self) -> bool {
        match self.last {
            Some(at) if at.elapsed() < DECODE_WARN_INTERVAL => {
                self.suppressed += 1;
                false
            }
            _ => {
                self.last = Some(Instant::now());
                true
            }
        }
    }

    /// Number of events swallowed since the last logged one, resetting it.
    fn take_suppressed(&mut self) -> u32 {
        std::mem::take(&mut self.suppressed)
    }
}

/// The receive loop: serial frames in, filtered reports queued for USB.
pub struct FrameReceiver {
    filter: KeyFilter,
    keyboard_queue: Arc<ReportQueue<KeyboardReport>>,
    mouse_queue: Arc<ReportQueue<MouseReport>>,
}

impl FrameReceiver {
    pub fn new(
        filter: KeyFilter,
        keyboard_queue: Arc<ReportQueue<KeyboardReport>>,
        mouse_queue: Arc<ReportQueue<MouseReport>>,
    ) -> Self {
        Self {
            filter,
            keyboard_queue,
            mouse_queue,
        }
    }

    /// Reads frames until the link closes or `running` is cleared.
    pub fn run<R: LinkRead>(&mut self, link: &mut R, running: &AtomicBool) {
        let mut throttle = WarnThrottle::new();
        while running.load(Ordering::Relaxed) {
            match recv_frame(link, Deadline::after(RECV_DEADLINE)) {
                Ok(frame) => self.handle_frame(&frame),
                Err(FrameError::Timeout) => {}
                Err(FrameError::LinkClosed) => {
                    info!("serial link closed, receiver stopping");
                    break;
                }
                Err(FrameError::UnknownKind(kind)) => {
                    info!("skipping frame with unknown kind {kind:#04x}");
                }
                Err(e) => {
                    if throttle.should_log() {
                        let suppressed = throttle.take_suppressed();
                        if suppressed > 0 {
                            warn!("discarding undecodable frame: {e} ({suppressed} earlier errors suppressed)");
                        } else {
                            warn!("discarding undecodable frame: {e}");
                        }
                    }
                }
            }
        }
        info!("frame receiver stopped");
    }

    fn handle_frame(&mut self, frame: &Frame) {
        match frame.kind() {
            FrameKind::KeyboardReport => self.on_keyboard(frame.payload()),
            FrameKind::MouseReport => self.on_mouse(frame.payload()),
            FrameKind::Status => {
                info!("host node: {}", String::from_utf8_lossy(frame.payload()));
            }
            FrameKind::LedUpdate => {
                debug!("ignoring LedUpdate frame addressed to the host side");
            }
            FrameKind::Ack => {
                debug!("ignoring Ack frame");
            }
        }
    }

    fn on_keyboard(&mut self, payload: &[u8]) {
        let Some(report) = KeyboardReport::from_bytes(payload) else {
            warn!("dropping keyboard report with bad length {}", payload.len());
            return;
        };
        if self.filter.filter(&report) == FilterAction::Swallow {
            return;
        }
        if self.keyboard_queue.enqueue(report).is_some() {
            warn!("keyboard queue full, oldest report dropped");
        }
    }

    fn on_mouse(&mut self, payload: &[u8]) {
        let Some(report) = MouseReport::from_payload(payload) else {
            warn!("dropping mouse report with bad length {}", payload.len());
            return;
        };
        if self.mouse_queue.enqueue(report).is_some() {
            warn!("mouse queue full, oldest report dropped");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use hidlink_core::report::keys;
    use hidlink_core::{FrameSender, LinkWrite, MemoryLink, ModifierFlags};
    use std::thread;

    fn make_receiver(
        capacity: usize,
    ) -> (
        FrameReceiver,
        Arc<ReportQueue<KeyboardReport>>,
        Arc<ReportQueue<MouseReport>>,
    ) {
        let keyboard_queue = Arc::new(ReportQueue::with_capacity(capacity));
        let mouse_queue = Arc::new(ReportQueue::with_capacity(capacity));
        let receiver = FrameReceiver::new(
            KeyFilter::new(),
            Arc::clone(&keyboard_queue),
            Arc::clone(&mouse_queue),
        );
        (receiver, keyboard_queue, mouse_queue)
    }

    /// Round-trips `payload` through the codec to obtain a decoded frame.
    fn frame_from(kind: FrameKind, payload: &[u8]) -> Frame {
        let (tx, mut rx) = MemoryLink::pair();
        FrameSender::new(tx)
            .send(kind, payload)
            .expect("encode should succeed");
        recv_frame(&mut rx, Deadline::after(Duration::from_secs(1))).expect("decode should succeed")
    }

    /// Blocks until `cond` holds, or fails the test after two seconds.
    fn wait_until(cond: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !cond() {
            assert!(Instant::now() < deadline, "condition not met in time");
            thread::sleep(Duration::from_millis(5));
        }
    }

    // ── Frame routing ─────────────────────────────────────────────────────────

    #[test]
    fn test_keyboard_frame_is_queued() {
        // Arrange
        let (mut receiver, keyboard_queue, _) = make_receiver(8);
        let payload = [0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00];

        // Act
        receiver.handle_frame(&frame_from(FrameKind::KeyboardReport, &payload));

        // Assert
        let report = keyboard_queue.try_dequeue().expect("report should be queued");
        assert_eq!(report.keys[0], 0x04);
        assert_eq!(report.modifiers, ModifierFlags(0));
    }

    #[test]
    fn test_malformed_keyboard_payload_is_dropped() {
        // Arrange – seven bytes is not a boot keyboard report
        let (mut receiver, keyboard_queue, _) = make_receiver(8);

        // Act
        receiver.handle_frame(&frame_from(FrameKind::KeyboardReport, &[0u8; 7]));

        // Assert
        assert!(keyboard_queue.is_empty());
    }

    #[test]
    fn test_short_mouse_payload_is_padded_and_queued() {
        // Arrange – three-byte report: left button, dx +5, dy -3
        let (mut receiver, _, mouse_queue) = make_receiver(8);

        // Act
        receiver.handle_frame(&frame_from(FrameKind::MouseReport, &[0x01, 0x05, 0xFD]));

        // Assert – wheel and pan default to zero
        let report = mouse_queue.try_dequeue().expect("report should be queued");
        assert_eq!(report.buttons, 0x01);
        assert_eq!(report.dx, 5);
        assert_eq!(report.dy, -3);
        assert_eq!(report.wheel, 0);
        assert_eq!(report.pan, 0);
    }

    #[test]
    fn test_oversized_mouse_payload_is_dropped() {
        let (mut receiver, _, mouse_queue) = make_receiver(8);

        receiver.handle_frame(&frame_from(FrameKind::MouseReport, &[0u8; 6]));

        assert!(mouse_queue.is_empty());
    }

    #[test]
    fn test_chord_report_is_swallowed_before_the_queue() {
        // Arrange – both shifts, no keys: the command chord
        let (mut receiver, keyboard_queue, _) = make_receiver(8);
        let chord = [ModifierFlags::BOTH_SHIFTS, 0, 0, 0, 0, 0, 0, 0];

        // Act
        receiver.handle_frame(&frame_from(FrameKind::KeyboardReport, &chord));

        // Assert – the PC never sees chord traffic
        assert!(keyboard_queue.is_empty());
    }

    #[test]
    fn test_reboot_chord_is_swallowed() {
        let (mut receiver, keyboard_queue, _) = make_receiver(8);
        let reboot = [ModifierFlags::BOTH_SHIFTS, 0, keys::HOME, 0, 0, 0, 0, 0];

        receiver.handle_frame(&frame_from(FrameKind::KeyboardReport, &reboot));

        assert!(keyboard_queue.is_empty());
    }

    #[test]
    fn test_status_and_ack_frames_do_not_touch_the_queues() {
        // Arrange
        let (mut receiver, keyboard_queue, mouse_queue) = make_receiver(8);

        // Act
        receiver.handle_frame(&frame_from(FrameKind::Status, b"host node online"));
        receiver.handle_frame(&frame_from(FrameKind::Ack, &[]));

        // Assert
        assert!(keyboard_queue.is_empty());
        assert!(mouse_queue.is_empty());
    }

    #[test]
    fn test_full_keyboard_queue_evicts_the_oldest_report() {
        // Arrange – capacity two, three reports
        let (mut receiver, keyboard_queue, _) = make_receiver(2);
        for key in [0x04u8, 0x05, 0x06] {
            let payload = [0x00, 0x00, key, 0x00, 0x00, 0x00, 0x00, 0x00];
            receiver.handle_frame(&frame_from(FrameKind::KeyboardReport, &payload));
        }

        // Act / Assert – the first report is gone, order preserved
        assert_eq!(keyboard_queue.try_dequeue().map(|r| r.keys[0]), Some(0x05));
        assert_eq!(keyboard_queue.try_dequeue().map(|r| r.keys[0]), Some(0x06));
        assert!(keyboard_queue.is_empty());
    }

    // ── Receive loop ──────────────────────────────────────────────────────────

    #[test]
    fn test_run_skips_junk_and_unknown_kinds() {
        // Arrange – junk bytes, then an unknown kind 0x07 frame, then a
        // valid keyboard report
        let (mut receiver, keyboard_queue, _) = make_receiver(8);
        let (mut tx, rx) = MemoryLink::pair();
        let running = Arc::new(AtomicBool::new(true));

        let worker = {
            let running = Arc::clone(&running);
            thread::spawn(move || {
                let mut link = rx;
                receiver.run(&mut link, &running);
            })
        };

        // Act
        tx.write(&[0xFF, 0xFF]).expect("write should succeed");
        tx.write(&[0xAA, 0x07, 0x00, 0x00, 0xAD]).expect("write should succeed");
        let sender = FrameSender::new(tx);
        sender
            .send(
                FrameKind::KeyboardReport,
                &[0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00],
            )
            .expect("send should succeed");

        // Assert – only the valid report survives
        wait_until(|| !keyboard_queue.is_empty());
        assert_eq!(keyboard_queue.try_dequeue().map(|r| r.keys[0]), Some(0x04));
        running.store(false, Ordering::Relaxed);
        worker.join().expect("receiver thread panicked");
    }

    #[test]
    fn test_run_stops_when_the_link_closes() {
        // Arrange
        let (mut receiver, _, _) = make_receiver(8);
        let (tx, rx) = MemoryLink::pair();
        let running = Arc::new(AtomicBool::new(true));

        let worker = {
            let running = Arc::clone(&running);
            thread::spawn(move || {
                let mut link = rx;
                receiver.run(&mut link, &running);
            })
        };

        // Act – the peer goes away
        drop(tx);

        // Assert – the loop exits on its own, flag still set
        worker.join().expect("receiver thread panicked");
        assert!(running.load(Ordering::Relaxed));
    }

    #[test]
    fn test_run_stops_when_the_flag_is_cleared() {
        // Arrange
        let (mut receiver, _, _) = make_receiver(8);
        let (_tx, rx) = MemoryLink::pair();
        let running = Arc::new(AtomicBool::new(true));

        let worker = {
            let running = Arc::clone(&running);
            thread::spawn(move || {
                let mut link = rx;
                receiver.run(&mut link, &running);
            })
        };

        // Act
        running.store(false, Ordering::Relaxed);

        // Assert – the loop notices within one poll deadline
        worker.join().expect("receiver thread panicked");
    }
}
