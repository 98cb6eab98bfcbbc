//! Zone registry: the receiver's map of registered zones.
//!
//! The registry associates zone numbers with [`ZoneHandle`]s. Registration
//! and removal can arrive from the host's lifecycle task at any time,
//! including while the worker is mid-way through a full poll, so all
//! access goes through one lightweight mutex and iteration works on a
//! snapshot of the key set -- the map is never held locked across I/O.
//!
//! Zones may register before or after the receiver starts; the worker
//! simply polls whatever is registered when a poll cycle runs.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::zone::ZoneHandle;

/// Bidirectional zone-number association for one receiver.
///
/// Cheap to clone; clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct ZoneRegistry {
    // BTreeMap keeps poll iteration in ascending zone order, which makes
    // full-poll wire traffic deterministic.
    zones: Arc<Mutex<BTreeMap<u8, ZoneHandle>>>,
}

impl ZoneRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a zone handle, replacing any previous handle for the same
    /// zone number. Idempotent.
    pub fn register(&self, zone: ZoneHandle) {
        self.zones.lock().insert(zone.number(), zone);
    }

    /// Remove a zone by number. Returns `true` if it was registered.
    pub fn unregister(&self, number: u8) -> bool {
        self.zones.lock().remove(&number).is_some()
    }

    /// Look up a zone handle by number.
    pub fn get(&self, number: u8) -> Option<ZoneHandle> {
        self.zones.lock().get(&number).cloned()
    }

    /// The registered zone numbers in ascending order.
    ///
    /// A snapshot: concurrent register/unregister calls do not disturb an
    /// iteration already underway.
    pub fn zone_numbers(&self) -> Vec<u8> {
        self.zones.lock().keys().copied().collect()
    }

    /// Snapshot of all registered handles in ascending zone order.
    pub fn handles(&self) -> Vec<ZoneHandle> {
        self.zones.lock().values().cloned().collect()
    }

    /// Number of registered zones.
    pub fn len(&self) -> usize {
        self.zones.lock().len()
    }

    /// Whether no zones are registered.
    pub fn is_empty(&self) -> bool {
        self.zones.lock().is_empty()
    }
}
