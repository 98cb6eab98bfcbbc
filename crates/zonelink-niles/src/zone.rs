//! Zone handles and status snapshots.
//!
//! A [`Zone`] represents one audio output channel on the receiver. Zones
//! hold identity (their zone number), capability flags, and a status
//! snapshot that mirrors the last state the receiver reported. The
//! snapshot is written only by the status reconciler in response to parsed
//! wire events; request issuers read it (e.g. to compute volume steps) but
//! never write it -- the receiver's own reply is the source of truth.

use parking_lot::Mutex;
use std::sync::Arc;

/// Options supplied when registering a zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZoneOptions {
    /// Surface this zone's volume and power as dimmer-style brightness
    /// and switch events in addition to the native zone events.
    pub dimmer_projection: bool,
}

/// The last known state of a zone, as reported by the receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneSnapshot {
    /// Whether the zone is powered on.
    pub powered: bool,
    /// Selected source (1-6).
    pub source: u8,
    /// Volume level (0-38).
    pub volume: u8,
    /// Whether the zone is muted.
    pub muted: bool,
    /// Bass level.
    pub bass: u8,
    /// Treble level.
    pub treble: u8,
}

impl Default for ZoneSnapshot {
    fn default() -> Self {
        // Source defaults to 1 so a power-on issued before the first
        // status poll selects a real input.
        ZoneSnapshot {
            powered: false,
            source: 1,
            volume: 0,
            muted: false,
            bass: 0,
            treble: 0,
        }
    }
}

/// One audio zone on a receiver.
///
/// Created via the receiver's `register_zone()`; shared as a
/// [`ZoneHandle`] between the registry, the worker, and the caller.
#[derive(Debug)]
pub struct Zone {
    number: u8,
    dimmer_projection: bool,
    status: Mutex<ZoneSnapshot>,
}

/// Shared handle to a [`Zone`].
pub type ZoneHandle = Arc<Zone>;

impl Zone {
    /// Create a new zone handle with a default snapshot.
    pub(crate) fn new(number: u8, options: ZoneOptions) -> ZoneHandle {
        Arc::new(Zone {
            number,
            dimmer_projection: options.dimmer_projection,
            status: Mutex::new(ZoneSnapshot::default()),
        })
    }

    /// The zone number (1-based).
    pub fn number(&self) -> u8 {
        self.number
    }

    /// Whether this zone surfaces dimmer-style projection events.
    pub fn has_dimmer_projection(&self) -> bool {
        self.dimmer_projection
    }

    /// A copy of the current status snapshot.
    pub fn snapshot(&self) -> ZoneSnapshot {
        self.status.lock().clone()
    }

    /// Whether the zone is powered on.
    pub fn is_powered_on(&self) -> bool {
        self.status.lock().powered
    }

    /// The current volume level.
    pub fn volume(&self) -> u8 {
        self.status.lock().volume
    }

    /// The current source number.
    pub fn source(&self) -> u8 {
        self.status.lock().source
    }

    /// Whether the zone is muted.
    pub fn is_muted(&self) -> bool {
        self.status.lock().muted
    }

    /// The current bass level.
    pub fn bass_level(&self) -> u8 {
        self.status.lock().bass
    }

    /// The current treble level.
    pub fn treble_level(&self) -> u8 {
        self.status.lock().treble
    }

    /// Mutate the snapshot under its lock. Reconciler use only.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut ZoneSnapshot) -> R) -> R {
        f(&mut self.status.lock())
    }
}
