//! # zonelink -- Multi-Zone Receiver Control
//!
//! `zonelink` is an asynchronous Rust library for driving Niles ZR-family
//! multi-zone audio receivers over their serial control port. It is
//! designed for home-automation bridges and control surfaces that need
//! reliable zone power, source, volume, mute, tone, and tuner control
//! without owning a GUI.
//!
//! ## Quick Start
//!
//! Add `zonelink` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! zonelink = "0.1"
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! Connect to a receiver and raise a zone's volume:
//!
//! ```no_run
//! use zonelink::niles::{NilesBuilder, models::zr_6};
//! use zonelink::ZoneEvent;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let receiver = NilesBuilder::new(zr_6())
//!         .serial_port("/dev/ttyUSB0")
//!         .source_label(1, "Streamer")
//!         .build()?;
//!
//!     let zone = receiver.register_zone(1, Default::default())?;
//!     let mut events = receiver.subscribe();
//!
//!     receiver.start().await?;
//!     receiver.set_zone_volume(1, 20)?;
//!
//!     while let Ok(event) = events.recv().await {
//!         if let ZoneEvent::VolumeChanged { zone, volume } = event {
//!             println!("zone {zone} volume now {volume}");
//!             break;
//!         }
//!     }
//!
//!     println!("snapshot: {:?}", zone.snapshot());
//!     receiver.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized as a workspace of focused crates:
//!
//! | Crate                   | Purpose                                    |
//! |-------------------------|--------------------------------------------|
//! | `zonelink-core`         | [`Transport`] trait, [`ZoneEvent`], errors |
//! | `zonelink-transport`    | Serial transport (38400-8N1)               |
//! | `zonelink-niles`        | Niles ZR protocol driver                   |
//! | `zonelink-test-harness` | Mock transport for deterministic tests     |
//! | **`zonelink`**          | This facade crate -- re-exports everything |
//!
//! ## Why a command queue?
//!
//! The wire protocol is stateful (one "active control zone" per receiver)
//! and settle-sensitive, so every receiver gets exactly one worker task
//! that owns the serial port and executes commands strictly in submission
//! order. Request methods are fire-and-forget: they validate, enqueue,
//! and return; results arrive as [`ZoneEvent`]s when the receiver reports
//! its new state.
//!
//! ## Feature Flags
//!
//! | Feature  | Enables                                   | Default |
//! |----------|-------------------------------------------|---------|
//! | `niles`  | [`niles`] module (ZR protocol driver)     | yes     |
//! | `serial` | [`transport`] module (serial port)        | yes     |

pub use zonelink_core::*;

/// Niles ZR protocol driver.
///
/// Provides [`NilesReceiver`](niles::NilesReceiver) and
/// [`NilesBuilder`](niles::NilesBuilder) for controlling ZR-family
/// receivers, plus the pure protocol codec for tooling that only needs
/// encode/decode.
#[cfg(feature = "niles")]
pub mod niles {
    pub use zonelink_niles::*;
}

/// Serial transport implementation.
///
/// Provides [`SerialTransport`](transport::SerialTransport), the
/// [`Transport`] implementation for the receiver's RS-232 control port.
#[cfg(feature = "serial")]
pub mod transport {
    pub use zonelink_transport::*;
}
