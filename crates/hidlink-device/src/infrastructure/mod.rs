//! Infrastructure layer for the device node.
//!
//! Contains hardware-facing adapters: the USB device port the PC
//! enumerates and file-system storage for the configuration.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `hidlink_core`, but MUST NOT be imported by the `application` or
//! protocol layers.
//!
//! # Sub-modules
//!
//! - **`usb`** – the USB device port: report descriptors for the composite
//!   keyboard-and-mouse function and the `HidDeviceStack` backends. A
//!   `MockDeviceStack` is provided for tests and for machines without a
//!   device-capable port.
//!
//! - **`storage`** – loads and saves the node's TOML configuration file.

pub mod storage;
pub mod usb;
