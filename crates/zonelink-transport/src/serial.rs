//! Serial port transport for zone receiver communication.
//!
//! This module provides [`SerialTransport`], which implements the
//! [`Transport`] trait for the RS-232 link to a zone receiver.
//!
//! The receiver family speaks 38400 baud, 8-N-1, no flow control. Those
//! framing parameters are fixed by the hardware, so [`SerialConfig`] only
//! exposes the knobs that actually vary between installations: the baud
//! rate (older firmware revisions shipped at 9600) and the write timeout.
//!
//! # Example
//!
//! ```no_run
//! use zonelink_transport::SerialTransport;
//! use zonelink_core::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> zonelink_core::Result<()> {
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", 38_400).await?;
//!
//! // Query status of the active zone.
//! transport.send(b"znc,5\r").await?;
//!
//! // Drain the reply, settling briefly for trailing bytes.
//! let reply = transport.read_available(Duration::from_millis(50)).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use zonelink_core::error::{Error, Result};
use zonelink_core::transport::Transport;

/// Serial port configuration.
///
/// Data bits, parity, and stop bits are fixed at 8-N-1 -- the only framing
/// the receiver hardware supports.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Baud rate. The factory default for this receiver family is 38400.
    pub baud_rate: u32,
    /// Upper bound on a single blocking write.
    pub write_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 38_400,
            write_timeout: Duration::from_secs(1),
        }
    }
}

/// Serial port transport for zone receiver communication.
///
/// Implements the [`Transport`] trait over a `tokio-serial` stream.
#[derive(Debug)]
pub struct SerialTransport {
    /// The underlying serial port stream; `None` after close.
    port: Option<SerialStream>,
    /// Port name for logging.
    port_name: String,
    /// Write timeout applied to each send.
    write_timeout: Duration,
}

impl SerialTransport {
    /// Open a serial port with the given baud rate and 8-N-1 framing.
    ///
    /// # Arguments
    ///
    /// * `port` - Serial port path (e.g. "/dev/ttyUSB0" on Linux,
    ///   "COM3" on Windows)
    /// * `baud_rate` - Baud rate (38400 for current firmware)
    pub async fn open(port: &str, baud_rate: u32) -> Result<Self> {
        let config = SerialConfig {
            baud_rate,
            ..Default::default()
        };
        Self::open_with_config(port, config).await
    }

    /// Open a serial port with full configuration control.
    pub async fn open_with_config(port: &str, config: SerialConfig) -> Result<Self> {
        tracing::debug!(port = %port, baud_rate = config.baud_rate, "Opening serial port");

        let serial_stream = tokio_serial::new(port, config.baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| {
                tracing::error!(port = %port, error = %e, "Failed to open serial port");
                Error::Connection(format!("failed to open serial port {port}: {e}"))
            })?;

        tracing::info!(port = %port, baud_rate = config.baud_rate, "Serial port opened");

        Ok(Self {
            port: Some(serial_stream),
            port_name: port.to_string(),
            write_timeout: config.write_timeout,
        })
    }

    /// Get the name of the serial port.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

/// Map an I/O error to a transport error, classifying dropped links.
fn classify_io_error(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::BrokenPipe || e.kind() == std::io::ErrorKind::NotConnected {
        Error::ConnectionLost
    } else {
        Error::Io(e)
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        tracing::trace!(
            port = %self.port_name,
            data = %String::from_utf8_lossy(data).trim_end(),
            "Sending command"
        );

        let write = async {
            port.write_all(data).await?;
            port.flush().await
        };

        match tokio::time::timeout(self.write_timeout, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                tracing::error!(port = %self.port_name, error = %e, "Serial write failed");
                Err(classify_io_error(e))
            }
            Err(_) => {
                tracing::error!(port = %self.port_name, "Serial write timed out");
                Err(Error::Timeout)
            }
        }
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        match tokio::time::timeout(timeout, port.read(buf)).await {
            Ok(Ok(n)) => {
                tracing::trace!(
                    port = %self.port_name,
                    data = %String::from_utf8_lossy(&buf[..n]).trim_end(),
                    "Received data"
                );
                Ok(n)
            }
            Ok(Err(e)) => {
                tracing::error!(port = %self.port_name, error = %e, "Serial read failed");
                Err(classify_io_error(e))
            }
            Err(_) => Err(Error::Timeout),
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            tracing::debug!(port = %self.port_name, "Closing serial port");

            // Flush any pending data before the port drops.
            if let Err(e) = port.flush().await {
                tracing::warn!(port = %self.port_name, error = %e, "Flush before close failed");
            }

            tracing::info!(port = %self.port_name, "Serial port closed");
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_config_default_matches_receiver_link() {
        let config = SerialConfig::default();
        assert_eq!(config.baud_rate, 38_400);
        assert_eq!(config.write_timeout, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn open_nonexistent_port_is_connection_error() {
        let result = SerialTransport::open("/dev/zonelink-nonexistent", 38_400).await;
        match result {
            Err(Error::Connection(msg)) => {
                assert!(msg.contains("/dev/zonelink-nonexistent"));
            }
            other => panic!("expected Connection error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        // A transport that never opened a port: close must still succeed,
        // repeatedly.
        let mut t = SerialTransport {
            port: None,
            port_name: "test".into(),
            write_timeout: Duration::from_secs(1),
        };
        t.close().await.unwrap();
        t.close().await.unwrap();
        assert!(!t.is_connected());
    }

    #[tokio::test]
    async fn send_after_close_is_not_connected() {
        let mut t = SerialTransport {
            port: None,
            port_name: "test".into(),
            write_timeout: Duration::from_secs(1),
        };
        let result = t.send(b"znc,5\r").await;
        assert!(matches!(result, Err(Error::NotConnected)));

        let mut buf = [0u8; 16];
        let result = t.receive(&mut buf, Duration::from_millis(10)).await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }

    #[test]
    fn classify_broken_pipe_as_connection_lost() {
        let e = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        assert!(matches!(classify_io_error(e), Error::ConnectionLost));

        let e = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(classify_io_error(e), Error::Io(_)));
    }
}
