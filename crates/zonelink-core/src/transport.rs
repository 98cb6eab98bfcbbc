//! Transport trait for receiver communication.
//!
//! The [`Transport`] trait abstracts over the physical link to a zone
//! receiver. Implementations exist for serial ports (the only link the
//! hardware offers) and mock transports for testing.
//!
//! The driver's worker loop operates on a `Transport` rather than directly
//! on a serial port, enabling both real hardware control and deterministic
//! unit testing with `MockTransport` from the `zonelink-test-harness` crate.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{Error, Result};

/// Upper bound on a single [`Transport::read_available`] drain.
///
/// The receiver's status chatter is a handful of short ASCII lines per
/// command; anything approaching this limit means the device is wedged
/// and the drain must not spin forever.
const MAX_DRAIN_BYTES: usize = 16 * 1024;

/// Asynchronous byte-level transport to a zone receiver.
///
/// Implementations handle buffering and error classification at the
/// physical layer. Protocol-level concerns (command framing, status line
/// parsing) are handled by the driver that consumes this trait.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the receiver.
    ///
    /// Implementations should block until all bytes have been written to
    /// the underlying transport (serial TX buffer).
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the receiver into the provided buffer.
    ///
    /// Returns the number of bytes actually read. Will wait up to `timeout`
    /// for data to arrive; returns [`Error::Timeout`] if no data is
    /// received within the deadline.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Close the transport connection.
    ///
    /// Idempotent: closing an already-closed (or never-opened) transport
    /// is not an error. After `close()`, subsequent `send()` and
    /// `receive()` calls should return [`Error::NotConnected`].
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;

    /// Drain whatever the receiver has sent, coalescing fragmented arrivals.
    ///
    /// Replies carry no framing beyond line terminators, so a reply may
    /// arrive split across several reads. This drain keeps re-reading with
    /// the short `settle` timeout until the line goes quiet, then returns
    /// everything collected. An empty `Vec` means nothing arrived within
    /// the first `settle` window.
    ///
    /// Timeouts terminate the drain; any other error propagates.
    async fn read_available(&mut self, settle: Duration) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut buf = [0u8; 256];
        loop {
            match self.receive(&mut buf, settle).await {
                Ok(0) => break,
                Ok(n) => {
                    out.extend_from_slice(&buf[..n]);
                    if out.len() >= MAX_DRAIN_BYTES {
                        break;
                    }
                }
                Err(Error::Timeout) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }
}
