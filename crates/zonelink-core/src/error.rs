//! Error types for zonelink.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport-layer and caller-input
//! errors are all captured here.

/// The error type for all zonelink operations.
///
/// Variants cover the failure modes encountered when driving a multi-zone
/// receiver over a serial line: port open failures, mid-session I/O
/// failures, and rejected caller input. Unrecognized protocol lines are
/// not errors -- the decoder skips them silently.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to open the connection to the receiver (bad port, device busy).
    ///
    /// Fatal to that receiver until the next reconnect attempt succeeds.
    #[error("connection error: {0}")]
    Connection(String),

    /// No connection to the receiver has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the receiver was lost mid-session.
    #[error("connection lost")]
    ConnectionLost,

    /// Timed out waiting for data from the receiver.
    ///
    /// The wire protocol never acknowledges control writes, so this is
    /// an expected outcome of a read drain, not a command failure.
    #[error("timeout waiting for data")]
    Timeout,

    /// The caller supplied an out-of-range zone, source, volume, or
    /// station. Rejected before any command is enqueued.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A protocol-level error (used by test transports for expectation
    /// mismatches).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// An underlying I/O error during a write or read.
    ///
    /// Triggers a single reconnect attempt in the worker loop.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` if this error indicates a broken transport that
    /// warrants a reconnect attempt.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::ConnectionLost | Error::NotConnected
        )
    }
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
