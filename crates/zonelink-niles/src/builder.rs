//! NilesBuilder -- fluent builder for constructing [`NilesReceiver`]
//! instances.
//!
//! Separates configuration from connection: the builder collects the
//! serial endpoint, pacing, polling, and source-label settings, and
//! `build()` returns an unstarted receiver -- the port is only opened by
//! [`NilesReceiver::start()`].
//!
//! # Example
//!
//! ```no_run
//! use zonelink_niles::builder::NilesBuilder;
//! use zonelink_niles::models::zr_6;
//! use std::time::Duration;
//!
//! # async fn example() -> zonelink_core::Result<()> {
//! let receiver = NilesBuilder::new(zr_6())
//!     .serial_port("/dev/ttyUSB0")
//!     .poll_interval(Duration::from_secs(300))
//!     .source_label(1, "Streamer")
//!     .source_label(2, "Turntable")
//!     .build()?;
//!
//! receiver.start().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use zonelink_core::error::{Error, Result};
use zonelink_core::transport::Transport;
use zonelink_transport::SerialTransport;

use crate::models::NilesModel;
use crate::receiver::{Connector, NilesReceiver, ReceiverConfig};
use crate::reconcile::SourceLabels;

/// Fluent builder for [`NilesReceiver`].
///
/// All pacing defaults match the protocol's observed settle requirements;
/// the simplest usage only needs a model and a serial port.
pub struct NilesBuilder {
    model: NilesModel,
    serial_port: Option<String>,
    baud_rate: Option<u32>,
    labels: SourceLabels,
    config: ReceiverConfig,
}

impl NilesBuilder {
    /// Create a new builder for the given receiver model.
    pub fn new(model: NilesModel) -> Self {
        NilesBuilder {
            model,
            serial_port: None,
            baud_rate: None,
            labels: SourceLabels::new(),
            config: ReceiverConfig {
                command_pause: Duration::from_millis(100),
                repeat_delay: Duration::from_millis(100),
                read_settle: Duration::from_millis(50),
                reconnect_pause: Duration::from_secs(1),
                join_timeout: Duration::from_secs(2),
                poll_interval: Duration::from_secs(300),
            },
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the model's default baud rate.
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = Some(baud);
        self
    }

    /// Set the full-poll interval (default: 300 s). Zero disables
    /// periodic polling.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Set the settle pause between consecutive commands of a poll cycle
    /// (default: 100 ms).
    pub fn command_pause(mut self, pause: Duration) -> Self {
        self.config.command_pause = pause;
        self
    }

    /// Set the pacing between repeated volume-step writes
    /// (default: 100 ms).
    pub fn repeat_delay(mut self, delay: Duration) -> Self {
        self.config.repeat_delay = delay;
        self
    }

    /// Set the settle timeout for the post-write reply drain
    /// (default: 50 ms).
    pub fn read_settle(mut self, settle: Duration) -> Self {
        self.config.read_settle = settle;
        self
    }

    /// Set the pause before a reconnect attempt (default: 1 s).
    pub fn reconnect_pause(mut self, pause: Duration) -> Self {
        self.config.reconnect_pause = pause;
        self
    }

    /// Set the bound on waiting for the worker during `stop()`
    /// (default: 2 s).
    pub fn join_timeout(mut self, timeout: Duration) -> Self {
        self.config.join_timeout = timeout;
        self
    }

    /// Set the display label for a source number (1-6). Labels outside
    /// the model's source range are ignored.
    pub fn source_label(mut self, source: u8, label: &str) -> Self {
        if source >= 1 && source <= self.model.source_count {
            self.labels.set(source, label);
        }
        self
    }

    /// Build a receiver that opens (and can reopen) a serial transport.
    ///
    /// Requires [`serial_port()`](Self::serial_port). The port itself is
    /// opened by `start()`, and the same connector serves the worker's
    /// reconnect attempts.
    pub fn build(self) -> Result<NilesReceiver> {
        let port = self.serial_port.clone().ok_or_else(|| {
            Error::InvalidParameter("serial_port is required for build()".into())
        })?;
        let baud = self.baud_rate.unwrap_or(self.model.default_baud_rate);

        let connector_port = port.clone();
        let connector: Connector = Arc::new(move || {
            let port = connector_port.clone();
            Box::pin(async move {
                let transport = SerialTransport::open(&port, baud).await?;
                Ok(Box::new(transport) as Box<dyn Transport>)
            })
        });

        Ok(NilesReceiver::new(
            self.model,
            port,
            self.labels,
            self.config,
            Some(connector),
            None,
        ))
    }

    /// Build a receiver with a caller-provided transport.
    ///
    /// This is the entry point for testing (pass a `MockTransport` from
    /// `zonelink-test-harness`). A provided transport cannot be reopened,
    /// so a mid-session I/O failure leaves the receiver in the `Error`
    /// state with no reconnect path.
    pub fn build_with_transport(self, transport: Box<dyn Transport>) -> NilesReceiver {
        let endpoint = self
            .serial_port
            .unwrap_or_else(|| "provided-transport".to_string());
        NilesReceiver::new(
            self.model,
            endpoint,
            self.labels,
            self.config,
            None,
            Some(transport),
        )
    }

    /// Build a receiver with no transport at all.
    ///
    /// Only useful for exercising validation and registration without a
    /// link; `start()` on such a receiver fails.
    pub fn build_unconnected(self) -> NilesReceiver {
        let endpoint = self
            .serial_port
            .unwrap_or_else(|| "unconnected".to_string());
        NilesReceiver::new(self.model, endpoint, self.labels, self.config, None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{zr_4, zr_6};
    use zonelink_core::types::ConnectionState;
    use zonelink_test_harness::MockTransport;

    #[test]
    fn build_requires_serial_port() {
        let result = NilesBuilder::new(zr_6()).build();
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn build_with_serial_port() {
        let receiver = NilesBuilder::new(zr_6())
            .serial_port("/dev/ttyUSB0")
            .baud_rate(9_600)
            .build()
            .unwrap();
        assert_eq!(receiver.info().model_name, "ZR-6");
        assert_eq!(receiver.info().endpoint, "/dev/ttyUSB0");
        assert_eq!(receiver.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn build_with_transport_for_tests() {
        let mock = MockTransport::new();
        let receiver = NilesBuilder::new(zr_4()).build_with_transport(Box::new(mock));
        assert_eq!(receiver.info().model_name, "ZR-4");
        assert_eq!(receiver.info().endpoint, "provided-transport");
    }

    #[test]
    fn source_labels_ignore_out_of_range() {
        let receiver = NilesBuilder::new(zr_6())
            .source_label(1, "CD")
            .source_label(0, "bogus")
            .source_label(7, "bogus")
            .build_unconnected();
        assert_eq!(receiver.source_label(1), "CD");
        assert_eq!(receiver.source_label(7), "7");
    }

    #[tokio::test]
    async fn start_without_transport_fails() {
        let receiver = NilesBuilder::new(zr_6()).build_unconnected();
        let result = receiver.start().await;
        assert!(matches!(result, Err(Error::Connection(_))));
        assert_eq!(receiver.connection_state(), ConnectionState::Error);
    }
}
