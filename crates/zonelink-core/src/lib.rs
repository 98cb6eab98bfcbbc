//! zonelink-core: Core traits, types, and error definitions for zonelink.
//!
//! This crate defines the protocol-agnostic abstractions that the zonelink
//! driver crates build on. Host automation layers depend on these types
//! without pulling in any specific receiver driver or transport.
//!
//! # Key types
//!
//! - [`Transport`] -- byte-level communication channel to a receiver
//! - [`ZoneEvent`] -- asynchronous zone state change notifications
//! - [`ConnectionState`] -- receiver connection lifecycle
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod events;
pub mod transport;
pub mod types;

// Re-export key types at crate root for ergonomic `use zonelink_core::*`.
pub use error::{Error, Result};
pub use events::ZoneEvent;
pub use transport::Transport;
pub use types::{ConnectionState, ReceiverInfo};
