//! zonelink-transport: serial transport for zone receiver communication.
//!
//! Multi-zone receivers of this family expose exactly one control link: an
//! RS-232 serial port (or a USB adapter presenting as one) fixed at
//! 8 data bits, no parity, 1 stop bit. This crate provides
//! [`SerialTransport`], the [`Transport`](zonelink_core::Transport)
//! implementation for that link.

mod serial;

pub use serial::{SerialConfig, SerialTransport};
