//! # hidlink-core
//!
//! Shared library for HidLink containing the serial wire protocol, USB HID
//! report types, bounded report queues, and the byte-link abstraction both
//! nodes talk through.
//!
//! This crate is used by both the host-node and device-node applications.
//! Apart from the serial-port adapter in [`link`] it has zero dependencies
//! on OS APIs or USB stacks.
//!
//! # Architecture overview (for beginners)
//!
//! HidLink is a two-box USB bridge: a keyboard and mouse plug into one box
//! (the "host node"), and a second box (the "device node") plugs into a PC
//! and enumerates as a keyboard and mouse.  The two boxes are joined by a
//! plain UART wire.  Everything the user types travels host → device; LED
//! state (Caps Lock and friends) travels device → host.
//!
//! This crate (`hidlink-core`) is the shared foundation.  It defines:
//!
//! - **`protocol`** – How bytes travel over the wire.  Each HID report is
//!   wrapped in a small frame (start byte, kind, length, XOR checksum) that
//!   a receiver can lock onto mid-stream after garbage or corruption.
//!
//! - **`report`** – The HID report shapes themselves: the 8-byte boot
//!   keyboard report, the 3-to-5-byte mouse report, and the LED bitfield.
//!
//! - **`queue`** – The bounded drop-oldest queues that decouple the frame
//!   decoder from the USB submit loop on the device node.
//!
//! - **`link`** – The byte transport underneath the codec: a real serial
//!   port for deployment and an in-memory pipe for tests.

// Declare the four top-level modules.  Rust will look for each in a file or
// subdirectory with the same name (e.g., src/protocol/mod.rs).
pub mod link;
pub mod protocol;
pub mod queue;
pub mod report;

// Re-export the most-used types at the crate root so callers can write
// `hidlink_core::FrameKind` instead of `hidlink_core::protocol::frame::FrameKind`.
pub use link::{Deadline, LinkConfig, LinkError, LinkRead, LinkWrite, MemoryLink, SerialLink};
pub use protocol::codec::{encode_frame_into, recv_frame, send_frame, FrameError, FrameSender};
pub use protocol::frame::{Frame, FrameKind, FRAME_OVERHEAD, MAX_FRAME, MAX_PAYLOAD, START_BYTE};
pub use queue::ReportQueue;
pub use report::{KeyboardReport, LedState, ModifierFlags, MouseReport};
