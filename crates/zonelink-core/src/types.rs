//! Core types used throughout zonelink.

use std::fmt;

/// Connection lifecycle of a receiver.
///
/// Transitions: `Disconnected -> Connecting -> Connected` on a successful
/// `start()`; `Connecting -> Error` when the port cannot be opened;
/// `Connected -> Error` on a mid-session I/O failure whose reconnect
/// attempt did not succeed; any state back to `Disconnected` on `stop()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection; the driver is stopped.
    Disconnected,
    /// The serial port is being opened.
    Connecting,
    /// The link is up and the worker is processing commands.
    Connected,
    /// The link failed; queued commands produce no wire effect until a
    /// reconnect attempt succeeds.
    Error,
}

impl ConnectionState {
    /// Returns `true` if commands sent now can reach the wire.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
            ConnectionState::Error => "Error",
        };
        write!(f, "{s}")
    }
}

/// Static information about a receiver driver instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverInfo {
    /// Human-readable model name (e.g. "ZR-6").
    pub model_name: String,
    /// The serial endpoint this receiver is reached through
    /// (e.g. "/dev/ttyUSB0"), or a placeholder for test transports.
    pub endpoint: String,
}

impl fmt::Display for ReceiverInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.model_name, self.endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_state_display() {
        assert_eq!(ConnectionState::Disconnected.to_string(), "Disconnected");
        assert_eq!(ConnectionState::Connecting.to_string(), "Connecting");
        assert_eq!(ConnectionState::Connected.to_string(), "Connected");
        assert_eq!(ConnectionState::Error.to_string(), "Error");
    }

    #[test]
    fn connection_state_is_connected() {
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Disconnected.is_connected());
        assert!(!ConnectionState::Connecting.is_connected());
        assert!(!ConnectionState::Error.is_connected());
    }

    #[test]
    fn receiver_info_display() {
        let info = ReceiverInfo {
            model_name: "ZR-6".into(),
            endpoint: "/dev/ttyUSB0".into(),
        };
        assert_eq!(info.to_string(), "ZR-6 on /dev/ttyUSB0");
    }
}
