//! Application layer use cases for the host node.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure protocol rules, in `hidlink-core`) and the infrastructure
//! (USB/serial/storage).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** the bridge: take reports from the USB side, push
//!   frames out over the link, and mirror LED state coming back.
//! - **Depend on abstractions** (traits) rather than concrete
//!   implementations, so the infrastructure can be swapped without
//!   changing this code.
//! - **Contain no USB calls, no serial I/O, no file system access** of
//!   their own — those live behind the injected traits.
//!
//! # Sub-modules
//!
//! - **`forward_reports`** – Receives captured HID reports and forwards
//!   them to the device node as frames.  This is the most critical use
//!   case — it runs on every keystroke and mouse movement.
//!
//! - **`led_feedback`** – Drains the link's receive side and applies
//!   LedUpdate frames to the physical keyboard, so Caps Lock and friends
//!   light up on the keyboard the operator is actually typing on.

pub mod forward_reports;
pub mod led_feedback;
