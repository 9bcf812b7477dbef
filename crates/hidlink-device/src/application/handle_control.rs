//! Use case: answer HID class control transfers from the PC.
//!
//! The PC reaches the device node with two control requests. `GET_REPORT`
//! polls the current report state; this node has none worth answering with,
//! so the reply is empty and the stack stalls the transfer. `SET_REPORT`
//! pushes an OUTPUT report down, and the only OUTPUT report a boot keyboard
//! receives is the LED bitfield (Num Lock, Caps Lock, Scroll Lock). The
//! bitfield is logged here and forwarded upstream as an `LedUpdate` frame so
//! the host node can light the physical keyboard.

use std::sync::Arc;

use hidlink_core::{FrameKind, FrameSender, LedState, LinkWrite};
use tracing::{debug, info, warn};

use crate::infrastructure::usb::descriptors::{KEYBOARD_INTERFACE, REPORT_TYPE_OUTPUT};

/// Answers `GET_REPORT` / `SET_REPORT` control transfers.
pub struct ControlHandler<W: LinkWrite> {
    sender: Arc<FrameSender<W>>,
}

impl<W: LinkWrite> ControlHandler<W> {
    pub fn new(sender: Arc<FrameSender<W>>) -> Self {
        Self { sender }
    }

    /// Handles `GET_REPORT`. An empty reply makes the stack stall the
    /// transfer, which is the correct answer for a device with no
    /// report state of its own.
    pub fn get_report(&self, interface: u8, report_id: u8) -> Vec<u8> {
        debug!("GET_REPORT for interface {interface}, report {report_id}: stalling");
        Vec::new()
    }

    /// Handles `SET_REPORT`. A keyboard OUTPUT report carries the LED
    /// bitfield in its first byte; everything else is ignored.
    pub fn set_report(&self, interface: u8, report_type: u8, payload: &[u8]) {
        if report_type != REPORT_TYPE_OUTPUT || interface != KEYBOARD_INTERFACE {
            debug!("ignoring SET_REPORT for interface {interface}, type {report_type}");
            return;
        }
        let Some(&led_byte) = payload.first() else {
            warn!("empty OUTPUT report on the keyboard interface");
            return;
        };

        let leds = LedState(led_byte);
        info!(
            "keyboard LEDs: NumLock={} CapsLock={} ScrollLock={}",
            leds.num_lock(),
            leds.caps_lock(),
            leds.scroll_lock()
        );
        if let Err(e) = self.sender.send(FrameKind::LedUpdate, &[led_byte]) {
            warn!("dropping LED update: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::usb::descriptors::MOUSE_INTERFACE;
    use hidlink_core::{recv_frame, Deadline, FrameError, MemoryLink};
    use std::time::Duration;

    fn handler_over_memory_link() -> (ControlHandler<MemoryLink>, MemoryLink) {
        let (upstream_tx, upstream_rx) = MemoryLink::pair();
        let handler = ControlHandler::new(Arc::new(FrameSender::new(upstream_tx)));
        (handler, upstream_rx)
    }

    #[test]
    fn test_keyboard_output_report_goes_upstream_as_led_update() {
        // Arrange
        let (handler, mut upstream) = handler_over_memory_link();

        // Act – Caps Lock + Num Lock lit
        handler.set_report(KEYBOARD_INTERFACE, REPORT_TYPE_OUTPUT, &[0x03]);

        // Assert
        let frame = recv_frame(&mut upstream, Deadline::after(Duration::from_secs(1)))
            .expect("LED frame should arrive");
        assert_eq!(frame.kind(), FrameKind::LedUpdate);
        assert_eq!(frame.payload(), &[0x03]);
    }

    #[test]
    fn test_mouse_interface_output_report_is_ignored() {
        // Arrange
        let (handler, mut upstream) = handler_over_memory_link();

        // Act
        handler.set_report(MOUSE_INTERFACE, REPORT_TYPE_OUTPUT, &[0x01]);

        // Assert – nothing crossed the link
        let result = recv_frame(&mut upstream, Deadline::after(Duration::from_millis(20)));
        assert!(matches!(result, Err(FrameError::Timeout)));
    }

    #[test]
    fn test_non_output_report_type_is_ignored() {
        // Arrange
        let (handler, mut upstream) = handler_over_memory_link();

        // Act – report type 1 is INPUT
        handler.set_report(KEYBOARD_INTERFACE, 1, &[0x03]);

        // Assert
        let result = recv_frame(&mut upstream, Deadline::after(Duration::from_millis(20)));
        assert!(matches!(result, Err(FrameError::Timeout)));
    }

    #[test]
    fn test_empty_output_report_is_ignored() {
        // Arrange
        let (handler, mut upstream) = handler_over_memory_link();

        // Act
        handler.set_report(KEYBOARD_INTERFACE, REPORT_TYPE_OUTPUT, &[]);

        // Assert
        let result = recv_frame(&mut upstream, Deadline::after(Duration::from_millis(20)));
        assert!(matches!(result, Err(FrameError::Timeout)));
    }

    #[test]
    fn test_get_report_replies_with_nothing() {
        // Arrange
        let (handler, _upstream) = handler_over_memory_link();

        // Act / Assert
        assert!(handler.get_report(KEYBOARD_INTERFACE, 0).is_empty());
        assert!(handler.get_report(MOUSE_INTERFACE, 0).is_empty());
    }

    #[test]
    fn test_upstream_failure_is_swallowed() {
        // Arrange – drop the receiving end so sends fail with a closed link
        let (handler, upstream) = handler_over_memory_link();
        drop(upstream);

        // Act – must not panic
        handler.set_report(KEYBOARD_INTERFACE, REPORT_TYPE_OUTPUT, &[0x07]);
    }
}
