//! Status reconciler: turns parsed status lines into minimal state changes.
//!
//! Given a [`ZoneStatus`] wire event and the zone's current snapshot, the
//! reconciler computes which fields actually changed, updates the
//! snapshot, and returns the corresponding [`ZoneChange`]s for the driver
//! to broadcast. Downstream consumers treat each notification as an
//! expensive update, so change detection is mandatory -- identical status
//! lines applied twice must produce no field changes the second time.
//!
//! Two protocol quirks shape the rules:
//!
//! - While a zone reports powered off, every field other than the power
//!   flag is stale garbage and must not touch the snapshot.
//! - The power notification carries a composite display value ("off",
//!   "muted", or the numeric volume), so it re-fires whenever volume or
//!   mute moved even if the power boolean itself did not.

use crate::protocol::ZoneStatus;
use crate::zone::Zone;

use zonelink_core::events::ZoneEvent;

/// Per-source display labels configured on the receiver.
///
/// Sources are 1-based; unlabeled sources fall back to the bare number.
#[derive(Debug, Clone, Default)]
pub struct SourceLabels {
    labels: Vec<(u8, String)>,
}

impl SourceLabels {
    /// Create an empty label table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the label for a source number.
    pub fn set(&mut self, source: u8, label: impl Into<String>) {
        let label = label.into();
        match self.labels.iter_mut().find(|(s, _)| *s == source) {
            Some(entry) => entry.1 = label,
            None => self.labels.push((source, label)),
        }
    }

    /// The display label for a source: the configured label, or the bare
    /// source number if unlabeled.
    pub fn label_for(&self, source: u8) -> String {
        self.labels
            .iter()
            .find(|(s, _)| *s == source)
            .map(|(_, label)| label.clone())
            .unwrap_or_else(|| source.to_string())
    }
}

/// One state change produced by reconciling a status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneChange {
    /// Power state (or its composite display text) changed.
    Power {
        /// New power state.
        on: bool,
        /// Display text: "off", "muted", or the numeric volume.
        display: String,
    },
    /// Source selection changed.
    Source {
        /// New source number.
        source: u8,
        /// Resolved display label.
        label: String,
    },
    /// Volume level changed.
    Volume(u8),
    /// Mute state changed.
    Mute(bool),
    /// Bass level changed.
    Bass(u8),
    /// Treble level changed.
    Treble(u8),
}

impl ZoneChange {
    /// Convert this change into the broadcast event for a zone.
    pub fn into_event(self, zone: u8) -> ZoneEvent {
        match self {
            ZoneChange::Power { on, display } => ZoneEvent::PowerChanged { zone, on, display },
            ZoneChange::Source { source, label } => {
                ZoneEvent::SourceChanged { zone, source, label }
            }
            ZoneChange::Volume(volume) => ZoneEvent::VolumeChanged { zone, volume },
            ZoneChange::Mute(muted) => ZoneEvent::MuteChanged { zone, muted },
            ZoneChange::Bass(level) => ZoneEvent::BassChanged { zone, level },
            ZoneChange::Treble(level) => ZoneEvent::TrebleChanged { zone, level },
        }
    }
}

/// The composite display value for the power notification.
///
/// - powered off: `"off"`
/// - muted, or volume zero: `"muted"`
/// - otherwise: the numeric volume as text
pub fn power_display(powered: bool, volume: u8, muted: bool) -> String {
    if !powered {
        "off".to_string()
    } else if muted || volume == 0 {
        "muted".to_string()
    } else {
        volume.to_string()
    }
}

/// Apply a parsed status line to a zone's snapshot, returning the minimal
/// set of changes to announce.
///
/// While the zone reports powered off, only the power state is touched;
/// the remaining fields keep their previous snapshot values. The power
/// change is emitted unconditionally in that case so the display value is
/// always refreshed.
pub fn apply_status(zone: &Zone, status: &ZoneStatus, labels: &SourceLabels) -> Vec<ZoneChange> {
    let mut changes = Vec::new();

    zone.update(|snap| {
        if !status.powered_on {
            snap.powered = false;
            changes.push(ZoneChange::Power {
                on: false,
                display: power_display(false, 0, false),
            });
            return;
        }

        let was_powered = snap.powered;

        if snap.source != status.source {
            snap.source = status.source;
            changes.push(ZoneChange::Source {
                source: status.source,
                label: labels.label_for(status.source),
            });
        }

        let volume_changed = snap.volume != status.volume;
        if volume_changed {
            snap.volume = status.volume;
            changes.push(ZoneChange::Volume(status.volume));
        }

        let mute_changed = snap.muted != status.muted;
        if mute_changed {
            snap.muted = status.muted;
            changes.push(ZoneChange::Mute(status.muted));
        }

        if snap.bass != status.bass {
            snap.bass = status.bass;
            changes.push(ZoneChange::Bass(status.bass));
        }

        if snap.treble != status.treble {
            snap.treble = status.treble;
            changes.push(ZoneChange::Treble(status.treble));
        }

        snap.powered = true;

        // The power notification doubles as the display-value carrier, so
        // it re-fires whenever volume or mute moved.
        if !was_powered || volume_changed || mute_changed {
            changes.push(ZoneChange::Power {
                on: true,
                display: power_display(true, status.volume, status.muted),
            });
        }
    });

    changes
}

/// Dimmer projection for zones registered with that capability.
///
/// Returns the brightness percentage and switch state to announce when
/// power or volume actually changed, `None` otherwise. Consumed only by
/// the driver's event mapper -- the reconciler core above knows nothing
/// about dimmers.
pub fn dimmer_projection(
    zone: &Zone,
    changes: &[ZoneChange],
    max_volume: u8,
) -> Option<(u8, bool)> {
    let relevant = changes
        .iter()
        .any(|c| matches!(c, ZoneChange::Power { .. } | ZoneChange::Volume(_)));
    if !relevant {
        return None;
    }

    let snap = zone.snapshot();
    let percent = if snap.powered {
        (snap.volume as u16 * 100 / max_volume as u16) as u8
    } else {
        0
    };
    Some((percent, snap.powered))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::{ZoneOptions, ZoneSnapshot};

    fn status(zone: u8, source: u8, on: bool, volume: u8, muted: bool) -> ZoneStatus {
        ZoneStatus {
            zone,
            source,
            powered_on: on,
            volume,
            muted,
            bass: 5,
            treble: 5,
        }
    }

    fn powered_zone(volume: u8, source: u8) -> crate::zone::ZoneHandle {
        let zone = Zone::new(1, ZoneOptions::default());
        zone.update(|snap| {
            *snap = ZoneSnapshot {
                powered: true,
                source,
                volume,
                muted: false,
                bass: 5,
                treble: 5,
            };
        });
        zone
    }

    // ---------------------------------------------------------------
    // Source labels
    // ---------------------------------------------------------------

    #[test]
    fn label_falls_back_to_number() {
        let mut labels = SourceLabels::new();
        labels.set(2, "Kitchen streamer");

        assert_eq!(labels.label_for(2), "Kitchen streamer");
        assert_eq!(labels.label_for(3), "3");
    }

    #[test]
    fn label_overwrite() {
        let mut labels = SourceLabels::new();
        labels.set(1, "CD");
        labels.set(1, "Turntable");
        assert_eq!(labels.label_for(1), "Turntable");
    }

    // ---------------------------------------------------------------
    // Display value rule
    // ---------------------------------------------------------------

    #[test]
    fn display_value_rule() {
        assert_eq!(power_display(false, 20, false), "off");
        assert_eq!(power_display(true, 0, false), "muted");
        assert_eq!(power_display(true, 20, true), "muted");
        assert_eq!(power_display(true, 15, false), "15");
    }

    // ---------------------------------------------------------------
    // Power-off masking
    // ---------------------------------------------------------------

    #[test]
    fn power_off_masks_all_other_fields() {
        let zone = powered_zone(20, 3);

        // The powered-off line reports nonsense values for everything else.
        let changes = apply_status(&zone, &status(1, 6, false, 0, true), &SourceLabels::new());

        assert_eq!(
            changes,
            vec![ZoneChange::Power {
                on: false,
                display: "off".into()
            }]
        );

        // Snapshot keeps the pre-off values apart from the power flag.
        let snap = zone.snapshot();
        assert!(!snap.powered);
        assert_eq!(snap.volume, 20);
        assert_eq!(snap.source, 3);
        assert!(!snap.muted);
    }

    #[test]
    fn power_off_always_reannounces() {
        let zone = Zone::new(1, ZoneOptions::default());

        let off = status(1, 1, false, 0, false);
        let first = apply_status(&zone, &off, &SourceLabels::new());
        let second = apply_status(&zone, &off, &SourceLabels::new());

        // Even with no change at all, the off notification re-fires so the
        // display value is refreshed.
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }

    // ---------------------------------------------------------------
    // Change detection
    // ---------------------------------------------------------------

    #[test]
    fn identical_status_twice_is_idempotent() {
        let zone = Zone::new(1, ZoneOptions::default());
        let st = status(1, 2, true, 10, false);
        let labels = SourceLabels::new();

        let first = apply_status(&zone, &st, &labels);
        assert!(!first.is_empty());

        let second = apply_status(&zone, &st, &labels);
        assert!(second.is_empty(), "second application produced {second:?}");
    }

    #[test]
    fn only_differing_fields_announced() {
        let zone = powered_zone(20, 3);

        // Same source and volume, different mute.
        let mut st = status(1, 3, true, 20, true);
        st.bass = 5;
        st.treble = 5;
        let changes = apply_status(&zone, &st, &SourceLabels::new());

        assert_eq!(
            changes,
            vec![
                ZoneChange::Mute(true),
                ZoneChange::Power {
                    on: true,
                    display: "muted".into()
                },
            ]
        );
    }

    #[test]
    fn source_change_resolves_label() {
        let zone = powered_zone(20, 1);
        let mut labels = SourceLabels::new();
        labels.set(4, "Tuner");

        let changes = apply_status(&zone, &status(1, 4, true, 20, false), &labels);

        assert!(changes.contains(&ZoneChange::Source {
            source: 4,
            label: "Tuner".into()
        }));
        // Source alone does not re-fire the power notification.
        assert!(!changes
            .iter()
            .any(|c| matches!(c, ZoneChange::Power { .. })));
    }

    #[test]
    fn power_on_transition_announces_power() {
        let zone = Zone::new(1, ZoneOptions::default());
        let changes = apply_status(&zone, &status(1, 1, true, 15, false), &SourceLabels::new());

        assert!(changes.contains(&ZoneChange::Power {
            on: true,
            display: "15".into()
        }));
        assert!(changes.contains(&ZoneChange::Volume(15)));
    }

    #[test]
    fn volume_move_refires_power_with_new_display() {
        let zone = powered_zone(10, 2);

        let changes = apply_status(&zone, &status(1, 2, true, 0, false), &SourceLabels::new());

        assert_eq!(
            changes,
            vec![
                ZoneChange::Volume(0),
                ZoneChange::Power {
                    on: true,
                    display: "muted".into()
                },
            ]
        );
    }

    #[test]
    fn bass_treble_tracked() {
        let zone = powered_zone(10, 2);

        let mut st = status(1, 2, true, 10, false);
        st.bass = 8;
        st.treble = 2;
        let changes = apply_status(&zone, &st, &SourceLabels::new());

        assert_eq!(changes, vec![ZoneChange::Bass(8), ZoneChange::Treble(2)]);
        let snap = zone.snapshot();
        assert_eq!(snap.bass, 8);
        assert_eq!(snap.treble, 2);
    }

    // ---------------------------------------------------------------
    // Event mapping
    // ---------------------------------------------------------------

    #[test]
    fn change_to_event_carries_zone_number() {
        let e = ZoneChange::Volume(12).into_event(7);
        assert_eq!(e, ZoneEvent::VolumeChanged { zone: 7, volume: 12 });

        let e = ZoneChange::Power {
            on: true,
            display: "12".into(),
        }
        .into_event(7);
        assert_eq!(
            e,
            ZoneEvent::PowerChanged {
                zone: 7,
                on: true,
                display: "12".into()
            }
        );
    }

    // ---------------------------------------------------------------
    // Dimmer projection
    // ---------------------------------------------------------------

    #[test]
    fn dimmer_projection_on_volume_change() {
        let zone = Zone::new(
            1,
            ZoneOptions {
                dimmer_projection: true,
            },
        );
        let changes = apply_status(&zone, &status(1, 1, true, 38, false), &SourceLabels::new());

        let (percent, on) = dimmer_projection(&zone, &changes, 38).unwrap();
        assert_eq!(percent, 100);
        assert!(on);
    }

    #[test]
    fn dimmer_projection_half_scale() {
        let zone = Zone::new(1, ZoneOptions::default());
        let changes = apply_status(&zone, &status(1, 1, true, 19, false), &SourceLabels::new());

        let (percent, _) = dimmer_projection(&zone, &changes, 38).unwrap();
        assert_eq!(percent, 50);
    }

    #[test]
    fn dimmer_projection_zero_when_off() {
        let zone = powered_zone(20, 2);
        let changes = apply_status(&zone, &status(1, 2, false, 0, false), &SourceLabels::new());

        let (percent, on) = dimmer_projection(&zone, &changes, 38).unwrap();
        assert_eq!(percent, 0);
        assert!(!on);
    }

    #[test]
    fn dimmer_projection_absent_without_relevant_change() {
        let zone = powered_zone(20, 2);

        // Only the source changes; brightness is untouched.
        let changes = apply_status(&zone, &status(1, 5, true, 20, false), &SourceLabels::new());
        assert!(dimmer_projection(&zone, &changes, 38).is_none());

        // No change at all.
        let changes = apply_status(&zone, &status(1, 5, true, 20, false), &SourceLabels::new());
        assert!(changes.is_empty());
        assert!(dimmer_projection(&zone, &changes, 38).is_none());
    }
}
