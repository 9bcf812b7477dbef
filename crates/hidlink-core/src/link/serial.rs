//! Serial-port adapter implementing the link traits over a UART.

use std::io::{Read, Write};
use std::time::Duration;

use serialport::SerialPort;
use tracing::info;

use super::{Deadline, LinkConfig, LinkError, LinkRead, LinkWrite};

/// Upper bound on a single blocking read against the port, so an unbounded
/// [`Deadline`] still re-checks for shutdown at a reasonable cadence.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// One half of an open serial port.
///
/// [`SerialLink::open`] returns a read half and a write half over the same
/// port, so the receive loop and the frame sender can live on different
/// threads.
pub struct SerialLink {
    port: Box<dyn SerialPort>,
}

impl SerialLink {
    /// Opens the configured port and splits it into read and write halves.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Serial`] if the port cannot be opened or cloned.
    pub fn open(config: &LinkConfig) -> Result<(SerialLink, SerialLink), LinkError> {
        let path = config.port_path();
        let port = serialport::new(path.as_str(), config.uart_baud)
            .timeout(POLL_INTERVAL)
            .open()?;
        let writer = port.try_clone()?;
        info!(
            "serial link open on {path} at {} baud (TX pin {}, RX pin {})",
            config.uart_baud, config.uart_tx_pin, config.uart_rx_pin
        );
        Ok((SerialLink { port }, SerialLink { port: writer }))
    }
}

impl LinkRead for SerialLink {
    fn read_until(&mut self, buf: &mut [u8], deadline: Deadline) -> Result<usize, LinkError> {
        let mut filled = 0;
        while filled < buf.len() {
            // Trim the port timeout to whatever deadline time remains.
            let wait = match deadline.remaining() {
                Some(rem) if rem.is_zero() => return Ok(filled),
                Some(rem) if rem < POLL_INTERVAL => rem,
                _ => POLL_INTERVAL,
            };
            self.port.set_timeout(wait)?;

            match self.port.read(&mut buf[filled..]) {
                Ok(0) => return Err(LinkError::Closed),
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    return Err(LinkError::Closed)
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}

impl LinkWrite for SerialLink {
    fn write(&mut self, buf: &[u8]) -> Result<usize, LinkError> {
        match self.port.write(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Err(LinkError::Closed),
            Err(e) => Err(e.into()),
        }
    }
}
