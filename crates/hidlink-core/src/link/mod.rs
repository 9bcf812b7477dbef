//! Byte-link abstraction underneath the frame codec.
//!
//! The codec never talks to hardware directly; it reads and writes through
//! the [`LinkRead`] / [`LinkWrite`] traits. Deployment uses the serial-port
//! adapter in [`serial`]; tests use the in-memory pipe in [`memory`].

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod memory;
pub mod serial;

pub use memory::MemoryLink;
pub use serial::SerialLink;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors surfaced by a byte link.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The peer is gone; no more bytes will ever move.
    #[error("link closed by peer")]
    Closed,

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial-port driver failure.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

// ── Deadline ──────────────────────────────────────────────────────────────────

/// Optional time bound on a blocking read.
///
/// A `Deadline` is an absolute instant, so a single value can bound a whole
/// multi-read frame decode: each read consumes whatever time remains.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// A deadline that never expires; reads block until bytes arrive or the
    /// link closes.
    pub fn never() -> Self {
        Self(None)
    }

    /// A deadline `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Self(Some(Instant::now() + timeout))
    }

    /// Time left until expiry: `None` for an unbounded deadline, zero once a
    /// bounded deadline has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.0.map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// True once a bounded deadline has passed.
    pub fn expired(&self) -> bool {
        matches!(self.remaining(), Some(rem) if rem.is_zero())
    }
}

// ── Link traits ───────────────────────────────────────────────────────────────

/// Read half of a byte link.
pub trait LinkRead: Send {
    /// Fills `buf`, blocking until it is full or `deadline` expires.
    ///
    /// Returns the number of bytes placed at the front of `buf`: a count
    /// equal to `buf.len()` means the buffer was filled, a smaller count
    /// means the deadline expired first. `Err(LinkError::Closed)` means the
    /// peer is gone and nothing more will arrive.
    fn read_until(&mut self, buf: &mut [u8], deadline: Deadline) -> Result<usize, LinkError>;
}

/// Write half of a byte link.
pub trait LinkWrite: Send {
    /// Writes `buf` in one call, returning how many bytes the link accepted.
    fn write(&mut self, buf: &[u8]) -> Result<usize, LinkError>;
}

// ── Configuration ─────────────────────────────────────────────────────────────

/// Serial link settings shared by both nodes.
///
/// Both nodes must agree on the baud rate; the pin numbers document the
/// wiring between the UART header and the peer and are echoed in the startup
/// log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// UART unit number; used to derive the default device path.
    #[serde(default = "default_uart_unit")]
    pub uart_unit: u8,
    /// TX pin wired to the peer's RX.
    #[serde(default = "default_uart_tx_pin")]
    pub uart_tx_pin: u8,
    /// RX pin wired to the peer's TX.
    #[serde(default = "default_uart_rx_pin")]
    pub uart_rx_pin: u8,
    /// Baud rate on the wire.
    #[serde(default = "default_uart_baud")]
    pub uart_baud: u32,
    /// Explicit device path; overrides the path derived from `uart_unit`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
}

fn default_uart_unit() -> u8 {
    1
}

fn default_uart_tx_pin() -> u8 {
    3
}

fn default_uart_rx_pin() -> u8 {
    4
}

fn default_uart_baud() -> u32 {
    921_600
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            uart_unit: default_uart_unit(),
            uart_tx_pin: default_uart_tx_pin(),
            uart_rx_pin: default_uart_rx_pin(),
            uart_baud: default_uart_baud(),
            port: None,
        }
    }
}

impl LinkConfig {
    /// Device path to open: the explicit `port` when set, otherwise a path
    /// derived from the UART unit number.
    pub fn port_path(&self) -> String {
        if let Some(path) = &self.port {
            return path.clone();
        }
        #[cfg(windows)]
        {
            format!("COM{}", self.uart_unit)
        }
        #[cfg(not(windows))]
        {
            format!("/dev/ttyUSB{}", self.uart_unit)
        }
    }
}
