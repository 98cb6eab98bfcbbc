//! Mock transport for deterministic testing of the receiver driver.
//!
//! [`MockTransport`] implements the [`Transport`] trait in memory. Unlike a
//! request/response protocol mock, it is built for this protocol's
//! fire-and-forget shape: every write is recorded unconditionally, and
//! replies are only produced for writes that have a scripted reply
//! registered (the receiver stays silent after most control commands).
//!
//! The transport is a cheap clone over shared state, so a test can hand
//! one clone to the driver and keep another to inspect the wire log after
//! the driver's worker has taken ownership.
//!
//! # Example
//!
//! ```
//! use zonelink_test_harness::MockTransport;
//!
//! let mock = MockTransport::new();
//! // When the driver activates zone 4, acknowledge it.
//! mock.reply_to(b"znc,4,4\r", b"rznc,4,4\r");
//! ```

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use zonelink_core::error::{Error, Result};
use zonelink_core::transport::Transport;

/// A scripted reply: when `request` is written, `reply` becomes readable.
#[derive(Debug, Clone)]
struct ScriptedReply {
    request: Vec<u8>,
    reply: Vec<u8>,
}

#[derive(Debug, Default)]
struct MockInner {
    /// Scripted request->reply pairs. Each is consumed on first match.
    replies: VecDeque<ScriptedReply>,
    /// Bytes waiting to be returned by `receive()`.
    pending: Vec<u8>,
    /// Whether the transport is "connected".
    connected: bool,
    /// Log of all bytes sent through this transport, one entry per send.
    sent_log: Vec<Vec<u8>>,
    /// Number of upcoming sends that should fail with an I/O error.
    failing_sends: u32,
}

/// A mock [`Transport`] for testing the receiver driver without hardware.
///
/// Clones share state: give one clone to the driver and keep one in the
/// test for scripting replies and inspecting the sent log.
#[derive(Debug, Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockInner>>,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            inner: Arc::new(Mutex::new(MockInner {
                connected: true,
                ..Default::default()
            })),
        }
    }

    /// Script a reply: the next time `request` is written, `reply` becomes
    /// available to `receive()`.
    ///
    /// Each scripted pair is consumed on first match; register the same
    /// pair twice to answer a request twice.
    pub fn reply_to(&self, request: &[u8], reply: &[u8]) {
        self.inner.lock().replies.push_back(ScriptedReply {
            request: request.to_vec(),
            reply: reply.to_vec(),
        });
    }

    /// Queue bytes for the next `receive()` call without tying them to a
    /// write -- simulates unsolicited status chatter from the receiver.
    pub fn push_incoming(&self, data: &[u8]) {
        self.inner.lock().pending.extend_from_slice(data);
    }

    /// Make the next `n` sends fail with a broken-pipe I/O error.
    pub fn fail_sends(&self, n: u32) {
        self.inner.lock().failing_sends = n;
    }

    /// Return a copy of all data sent through this transport, one entry
    /// per `send()` call.
    pub fn sent_data(&self) -> Vec<Vec<u8>> {
        self.inner.lock().sent_log.clone()
    }

    /// Return the sent log as trimmed ASCII lines, for readable asserts.
    pub fn sent_lines(&self) -> Vec<String> {
        self.inner
            .lock()
            .sent_log
            .iter()
            .map(|bytes| String::from_utf8_lossy(bytes).trim_end().to_string())
            .collect()
    }

    /// Number of `send()` calls so far.
    pub fn sent_count(&self) -> usize {
        self.inner.lock().sent_log.len()
    }

    /// Set the connected state of the mock transport.
    ///
    /// When set to `false`, subsequent `send()` and `receive()` calls
    /// return [`Error::NotConnected`].
    pub fn set_connected(&self, connected: bool) {
        self.inner.lock().connected = connected;
    }

    /// Whether the transport currently reports connected.
    pub fn connected(&self) -> bool {
        self.inner.lock().connected
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock();

        if !inner.connected {
            return Err(Error::NotConnected);
        }

        if inner.failing_sends > 0 {
            inner.failing_sends -= 1;
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock send failure",
            )));
        }

        inner.sent_log.push(data.to_vec());

        // Serve the first scripted reply whose request matches this write.
        if let Some(pos) = inner.replies.iter().position(|s| s.request == data) {
            let scripted = inner
                .replies
                .remove(pos)
                .ok_or_else(|| Error::Protocol("scripted reply vanished".into()))?;
            inner.pending.extend_from_slice(&scripted.reply);
        }

        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        let mut inner = self.inner.lock();

        if !inner.connected {
            return Err(Error::NotConnected);
        }

        if inner.pending.is_empty() {
            return Err(Error::Timeout);
        }

        let n = inner.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&inner.pending[..n]);
        inner.pending.drain(..n);
        Ok(n)
    }

    async fn close(&mut self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.connected = false;
        inner.pending.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.inner.lock().connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_all_sends() {
        let mock = MockTransport::new();
        let mut driver_side = mock.clone();

        driver_side.send(b"znc,4,1\r").await.unwrap();
        driver_side.send(b"znc,5\r").await.unwrap();

        assert_eq!(mock.sent_lines(), vec!["znc,4,1", "znc,5"]);
        assert_eq!(mock.sent_count(), 2);
    }

    #[tokio::test]
    async fn scripted_reply_served_after_matching_send() {
        let mock = MockTransport::new();
        let mut driver_side = mock.clone();

        mock.reply_to(b"znc,4,3\r", b"rznc,4,3\r");

        // Unmatched write: no reply pending.
        driver_side.send(b"znc,5\r").await.unwrap();
        let mut buf = [0u8; 64];
        let result = driver_side
            .receive(&mut buf, Duration::from_millis(10))
            .await;
        assert!(matches!(result, Err(Error::Timeout)));

        // Matching write: reply becomes readable.
        driver_side.send(b"znc,4,3\r").await.unwrap();
        let n = driver_side
            .receive(&mut buf, Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(&buf[..n], b"rznc,4,3\r");
    }

    #[tokio::test]
    async fn scripted_reply_consumed_once() {
        let mock = MockTransport::new();
        let mut driver_side = mock.clone();

        mock.reply_to(b"znc,4,3\r", b"rznc,4,3\r");

        driver_side.send(b"znc,4,3\r").await.unwrap();
        let mut buf = [0u8; 64];
        driver_side
            .receive(&mut buf, Duration::from_millis(10))
            .await
            .unwrap();

        // Second identical write: the pair was consumed, no reply.
        driver_side.send(b"znc,4,3\r").await.unwrap();
        let result = driver_side
            .receive(&mut buf, Duration::from_millis(10))
            .await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn unsolicited_incoming_readable() {
        let mock = MockTransport::new();
        let mut driver_side = mock.clone();

        mock.push_incoming(b"usc,2,1,2,1,10,0,5,5\r");

        let mut buf = [0u8; 64];
        let n = driver_side
            .receive(&mut buf, Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(&buf[..n], b"usc,2,1,2,1,10,0,5,5\r");
    }

    #[tokio::test]
    async fn partial_receive_with_small_buffer() {
        let mock = MockTransport::new();
        let mut driver_side = mock.clone();

        mock.push_incoming(b"rznc,4,3\r");

        let mut buf = [0u8; 4];
        let n = driver_side
            .receive(&mut buf, Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(&buf[..n], b"rznc");

        let n = driver_side
            .receive(&mut buf, Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(&buf[..n], b",4,3");
    }

    #[tokio::test]
    async fn injected_send_failures() {
        let mock = MockTransport::new();
        let mut driver_side = mock.clone();

        mock.fail_sends(1);

        let result = driver_side.send(b"znc,5\r").await;
        assert!(matches!(result, Err(Error::Io(_))));

        // The injected failure was consumed; the next send succeeds.
        driver_side.send(b"znc,5\r").await.unwrap();
        assert_eq!(mock.sent_count(), 1);
    }

    #[tokio::test]
    async fn close_disconnects_shared_state() {
        let mock = MockTransport::new();
        let mut driver_side = mock.clone();

        assert!(mock.connected());
        driver_side.close().await.unwrap();
        assert!(!mock.connected());

        let result = driver_side.send(b"znc,5\r").await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }
}
