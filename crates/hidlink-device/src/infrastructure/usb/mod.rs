//! The USB device port the PC enumerates.
//!
//! Descriptors for the composite keyboard-and-mouse function live in
//! [`descriptors`]; [`mock`] provides a scriptable `HidDeviceStack` for
//! tests and for running the node on machines without a device-capable
//! USB port.

pub mod descriptors;
pub mod mock;

// TODO: add a configfs usb_gadget backend for Linux UDC ports.
