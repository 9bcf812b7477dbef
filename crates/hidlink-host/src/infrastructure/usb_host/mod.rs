//! USB host infrastructure for the host node.
//!
//! On real hardware this side owns a USB host controller port: it enumerates
//! attached HID devices, claims their boot-protocol interfaces, and polls the
//! interrupt IN endpoints for input reports. Raw reports are placed into a
//! channel and consumed by the forwarding use case.
//!
//! # Boot protocol
//!
//! Only the HID *boot* protocol is requested from attached devices: keyboards
//! produce fixed 8-byte reports and mice 3 to 5 bytes, with no report
//! descriptor parsing required. That is exactly the shape the wire protocol
//! carries, so reports pass through unmodified.
//!
//! # Testability
//!
//! The `ReportSource` trait allows unit tests to inject synthetic reports
//! without requiring a USB controller.

use std::sync::mpsc;

pub mod mock;

/// A raw HID event produced by the USB host infrastructure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    /// An input report arrived from a keyboard-class interface.
    Keyboard {
        /// Raw report bytes as read from the interrupt IN endpoint.
        /// A boot keyboard produces exactly 8; anything else is rejected
        /// downstream.
        report: Vec<u8>,
    },
    /// An input report arrived from a mouse-class interface.
    Mouse {
        /// Raw report bytes; boot mice produce 3 to 5 bytes depending on
        /// wheel and pan support.
        report: Vec<u8>,
    },
    /// A HID device finished enumeration on the downstream port.
    Connected {
        /// USB vendor ID.
        vendor_id: u16,
        /// USB product ID.
        product_id: u16,
        /// Boot interface protocol (1 = keyboard, 2 = mouse).
        protocol: u8,
    },
    /// A previously enumerated HID device was unplugged.
    Disconnected {
        vendor_id: u16,
        product_id: u16,
    },
}

/// Error type for report capture operations.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to start the USB host stack: {0}")]
    StartFailed(String),
    #[error("capture has already been stopped")]
    AlreadyStopped,
}

/// Trait abstracting HID report production.
///
/// The production implementation drives a USB host controller; tests and the
/// headless binary use [`mock::MockReportSource`].
pub trait ReportSource: Send {
    /// Starts the source and returns a receiver for captured events.
    fn start(&self) -> Result<mpsc::Receiver<ReportEvent>, SourceError>;
    /// Stops the source and releases the underlying hardware.
    fn stop(&self);
}
