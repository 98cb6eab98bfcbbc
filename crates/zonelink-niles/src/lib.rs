//! Niles ZR multi-zone receiver protocol driver.
//!
//! This crate implements the serial control protocol used by the Niles
//! Audio ZR family of multi-zone receivers. It provides:
//!
//! - **Protocol codec** ([`protocol`]) -- encode and decode the
//!   carriage-return-terminated ASCII command and status lines, with
//!   silent skipping of unrecognized chatter.
//! - **Command builders** ([`commands`]) -- construct correctly-formatted
//!   zone function commands (power, source, mute, volume steps) and
//!   validate caller input against the receiver model's limits.
//! - **Model definitions** ([`models`]) -- static capability data for the
//!   supported chassis (ZR-4, ZR-6, linked-expansion systems).
//! - **Receiver driver** ([`receiver`]) -- the communication manager:
//!   transport lifecycle, the single-worker command queue, the
//!   zone-activation requirement, reply parsing, and state-diff event
//!   emission.
//! - **Builder** ([`builder`]) -- fluent configuration API for
//!   constructing [`NilesReceiver`] instances.
//!
//! # The activation quirk
//!
//! The protocol is stateful: the receiver holds one "active control zone",
//! and `znc,5` status queries and most control commands apply to whatever
//! zone was last activated with `znc,4,<zone>`. The driver tracks the
//! activation acknowledgments (`rznc,4,<zone>`) and prefixes commands with
//! an activation write only when the target differs from the currently
//! active zone.
//!
//! # Example
//!
//! ```
//! use zonelink_niles::protocol::{self, DecodeResult, ResponseEvent};
//!
//! // Build an "activate zone 4" command.
//! let cmd = protocol::encode_activate_zone(4);
//! assert_eq!(cmd, b"znc,4,4\r");
//!
//! // Decode a status reply from the receiver.
//! let reply = b"usc,2,4,2,1,20,0,5,5\r";
//! match protocol::decode_response(reply) {
//!     DecodeResult::Event { event: ResponseEvent::ZoneStatus(status), .. } => {
//!         assert_eq!(status.zone, 4);
//!         assert_eq!(status.volume, 20);
//!     }
//!     other => panic!("expected ZoneStatus, got {other:?}"),
//! }
//! ```

pub mod builder;
pub mod commands;
pub mod models;
pub mod poller;
pub mod protocol;
pub mod receiver;
pub mod reconcile;
pub mod registry;
pub mod zone;

// Re-export the primary types for ergonomic `use zonelink_niles::*`.
pub use builder::NilesBuilder;
pub use models::NilesModel;
pub use receiver::NilesReceiver;
pub use zone::{Zone, ZoneHandle, ZoneOptions, ZoneSnapshot};
