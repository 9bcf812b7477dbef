//! LED feedback: mirrors the PC's lock-key state onto the physical keyboard.
//!
//! The PC drives Caps/Num/Scroll Lock by sending SET_REPORT to the device
//! node, which forwards the LED bitfield upstream as a LedUpdate frame.
//! This use case drains the host side of the link and applies those frames
//! to the physical keyboard through the injected [`LedSink`], so the lock
//! lights follow the PC the operator is actually typing into.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use hidlink_core::{recv_frame, Deadline, Frame, FrameError, FrameKind, LedState, LinkRead};
use tracing::{debug, info, warn};

/// Per-attempt decode deadline; bounds how long the loop can go without
/// observing the shutdown flag.
const RECV_DEADLINE: Duration = Duration::from_millis(500);

/// Trait for applying LED state to the physical keyboard.
///
/// The production implementation issues a SET_REPORT through the USB host
/// stack; tests use a recording double.
pub trait LedSink: Send {
    /// Applies the LED bitfield to every attached keyboard.
    fn set_leds(&self, state: LedState);
}

/// Drains the link's receive side until `running` clears or the link closes.
///
/// LedUpdate frames go to `sink`, Status frames are logged, and decode
/// errors are skipped. Only a closed link terminates the loop early.
pub fn run_led_feedback<R, S>(link: &mut R, sink: &S, running: &AtomicBool)
where
    R: LinkRead,
    S: LedSink + ?Sized,
{
    while running.load(Ordering::Relaxed) {
        match recv_frame(link, Deadline::after(RECV_DEADLINE)) {
            Ok(frame) => handle_frame(&frame, sink),
            Err(FrameError::Timeout) => continue,
            Err(FrameError::LinkClosed) => {
                info!("link closed, LED feedback loop exiting");
                break;
            }
            Err(e) => warn!("discarding undecodable frame: {e}"),
        }
    }
}

fn handle_frame<S: LedSink + ?Sized>(frame: &Frame, sink: &S) {
    match frame.kind() {
        FrameKind::LedUpdate => match frame.payload().first() {
            Some(&bits) => {
                let state = LedState(bits);
                debug!(
                    "applying LEDs from device node: NumLock={} CapsLock={} ScrollLock={}",
                    state.num_lock(),
                    state.caps_lock(),
                    state.scroll_lock()
                );
                sink.set_leds(state);
            }
            None => warn!("LedUpdate frame with empty payload, ignoring"),
        },
        FrameKind::Status => {
            info!("device node: {}", String::from_utf8_lossy(frame.payload()));
        }
        other => debug!("ignoring {other:?} frame on the host side"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hidlink_core::{FrameSender, LinkWrite, MemoryLink};
    use std::sync::Mutex;

    struct RecordingLedSink {
        states: Mutex<Vec<LedState>>,
    }

    impl RecordingLedSink {
        fn new() -> Self {
            Self {
                states: Mutex::new(Vec::new()),
            }
        }

        fn states(&self) -> Vec<LedState> {
            self.states.lock().expect("lock poisoned").clone()
        }
    }

    impl LedSink for RecordingLedSink {
        fn set_leds(&self, state: LedState) {
            self.states.lock().expect("lock poisoned").push(state);
        }
    }

    #[test]
    fn test_led_update_applied_to_sink() {
        // Arrange
        let (tx, mut rx) = MemoryLink::pair();
        let sender = FrameSender::new(tx);
        sender
            .send(FrameKind::LedUpdate, &[LedState::NUM_LOCK | LedState::CAPS_LOCK])
            .expect("send should succeed");
        drop(sender); // closes the link so the loop terminates

        let sink = RecordingLedSink::new();
        let running = AtomicBool::new(true);

        // Act
        run_led_feedback(&mut rx, &sink, &running);

        // Assert
        let states = sink.states();
        assert_eq!(states.len(), 1);
        assert!(states[0].num_lock());
        assert!(states[0].caps_lock());
        assert!(!states[0].scroll_lock());
    }

    #[test]
    fn test_noise_before_frame_is_skipped() {
        // Arrange – two junk bytes ahead of a valid LedUpdate frame
        let (mut tx, mut rx) = MemoryLink::pair();
        tx.write(&[0x13, 0x37]).expect("write should succeed");
        let sender = FrameSender::new(tx);
        sender
            .send(FrameKind::LedUpdate, &[LedState::SCROLL_LOCK])
            .expect("send should succeed");
        drop(sender);

        let sink = RecordingLedSink::new();
        let running = AtomicBool::new(true);

        // Act
        run_led_feedback(&mut rx, &sink, &running);

        // Assert
        let states = sink.states();
        assert_eq!(states.len(), 1);
        assert!(states[0].scroll_lock());
    }

    #[test]
    fn test_status_frame_is_logged_not_applied() {
        // Arrange
        let (tx, mut rx) = MemoryLink::pair();
        let sender = FrameSender::new(tx);
        sender
            .send(FrameKind::Status, b"device online")
            .expect("send should succeed");
        drop(sender);

        let sink = RecordingLedSink::new();
        let running = AtomicBool::new(true);

        // Act
        run_led_feedback(&mut rx, &sink, &running);

        // Assert – status text never reaches the LED sink
        assert!(sink.states().is_empty());
    }

    #[test]
    fn test_empty_led_update_ignored() {
        // Arrange
        let (tx, mut rx) = MemoryLink::pair();
        let sender = FrameSender::new(tx);
        sender
            .send(FrameKind::LedUpdate, &[])
            .expect("send should succeed");
        drop(sender);

        let sink = RecordingLedSink::new();
        let running = AtomicBool::new(true);

        // Act
        run_led_feedback(&mut rx, &sink, &running);

        // Assert
        assert!(sink.states().is_empty());
    }

    #[test]
    fn test_cleared_running_flag_returns_immediately() {
        // Arrange
        let (_tx, mut rx) = MemoryLink::pair();
        let sink = RecordingLedSink::new();
        let running = AtomicBool::new(false);

        // Act / Assert – must not block waiting for a frame
        run_led_feedback(&mut rx, &sink, &running);
        assert!(sink.states().is_empty());
    }
}
