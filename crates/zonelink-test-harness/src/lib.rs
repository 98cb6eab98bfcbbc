//! zonelink-test-harness: mock transports for deterministic driver tests.
//!
//! Provides [`MockTransport`], an in-memory [`Transport`](zonelink_core::Transport)
//! implementation that records every write and serves scripted replies,
//! so driver behavior (command ordering, activation handling, reconnect
//! policy) can be asserted without hardware.

mod mock_serial;

pub use mock_serial::MockTransport;
