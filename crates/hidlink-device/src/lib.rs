//! hidlink-device library entry point.
//!
//! Re-exports all public modules so that unit tests and the binary entry
//! point in `main.rs` share the same module tree.

pub mod application;
pub mod infrastructure;
