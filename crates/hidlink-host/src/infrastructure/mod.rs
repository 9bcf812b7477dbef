//! Infrastructure layer for the host node.
//!
//! Contains hardware-facing adapters: the USB host report source and
//! file-system storage for the configuration.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `hidlink_core`, but MUST NOT be imported by the `application` or
//! protocol layers.

pub mod storage;
pub mod usb_host;
