//! Application layer use cases for the device node.
//!
//! # What use cases does the device node have?
//!
//! - **`receive_frames`** – Blocking decode loop on the serial link.  Routes
//!   each arriving frame by kind: keyboard reports through the command
//!   filter into the keyboard queue, mouse reports into the mouse queue,
//!   status text into the log.
//!
//! - **`filter_keys`** – Pure state machine between decode and enqueue that
//!   implements the operator command chord (both shifts held) without
//!   leaking chord traffic to the PC, including the lock/unlock password
//!   flow.
//!
//! - **`transmit_reports`** – Cooperative pump loop that drains the queues
//!   into the USB device stack, gated by per-interface readiness.
//!
//! - **`handle_control`** – SET_REPORT/GET_REPORT handling: LED output
//!   reports from the PC are logged and mirrored upstream to the host node.

pub mod filter_keys;
pub mod handle_control;
pub mod receive_frames;
pub mod transmit_reports;
