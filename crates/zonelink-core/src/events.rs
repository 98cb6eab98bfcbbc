//! Asynchronous zone event types.
//!
//! Events are emitted by the receiver driver through a
//! `tokio::sync::broadcast` channel when zone state changes are parsed
//! from the wire. Host automation layers subscribe to these events to
//! mirror zone state into their own device models without polling.

/// An event emitted by a receiver driver when zone or connection state
/// changes.
///
/// Subscribe via the driver's `subscribe()` method. Events are delivered
/// on a best-effort basis through a bounded broadcast channel; slow
/// consumers may miss events under heavy status traffic.
///
/// Field-level events are emitted only when the parsed value actually
/// differs from the zone's snapshot. The one exception is
/// [`PowerChanged`](ZoneEvent::PowerChanged), which re-fires whenever the
/// composite display text may have changed (volume or mute moved), and
/// always while a zone reports powered off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneEvent {
    /// The zone's power state (or its composite display text) changed.
    PowerChanged {
        /// Zone number.
        zone: u8,
        /// `true` if the zone is powered on.
        on: bool,
        /// Display text: `"off"`, `"muted"`, or the numeric volume.
        display: String,
    },

    /// The zone switched input source.
    SourceChanged {
        /// Zone number.
        zone: u8,
        /// New source number (1-6).
        source: u8,
        /// Configured source label, or the bare source number if unlabeled.
        label: String,
    },

    /// The zone's volume level changed.
    VolumeChanged {
        /// Zone number.
        zone: u8,
        /// New volume level (0-38).
        volume: u8,
    },

    /// The zone's mute state changed.
    MuteChanged {
        /// Zone number.
        zone: u8,
        /// `true` if the zone is muted.
        muted: bool,
    },

    /// The zone's bass level changed.
    BassChanged {
        /// Zone number.
        zone: u8,
        /// New bass level.
        level: u8,
    },

    /// The zone's treble level changed.
    TrebleChanged {
        /// Zone number.
        zone: u8,
        /// New treble level.
        level: u8,
    },

    /// Dimmer projection: the zone's volume expressed as a percentage.
    ///
    /// Only emitted for zones registered with the dimmer projection
    /// capability, whenever power or volume changed.
    BrightnessChanged {
        /// Zone number.
        zone: u8,
        /// Volume as 0-100 (%); 0 while the zone is off.
        percent: u8,
    },

    /// Dimmer projection: the zone's power state as an on/off switch.
    SwitchChanged {
        /// Zone number.
        zone: u8,
        /// `true` if the zone is powered on.
        on: bool,
    },

    /// Successfully connected to the receiver.
    Connected,

    /// Connection to the receiver was lost or closed.
    Disconnected,

    /// Attempting to reconnect after a connection loss.
    Reconnecting {
        /// The reconnection attempt number (1-based).
        attempt: u32,
    },
}

impl ZoneEvent {
    /// The zone number this event concerns, if it is a zone-level event.
    pub fn zone(&self) -> Option<u8> {
        match self {
            ZoneEvent::PowerChanged { zone, .. }
            | ZoneEvent::SourceChanged { zone, .. }
            | ZoneEvent::VolumeChanged { zone, .. }
            | ZoneEvent::MuteChanged { zone, .. }
            | ZoneEvent::BassChanged { zone, .. }
            | ZoneEvent::TrebleChanged { zone, .. }
            | ZoneEvent::BrightnessChanged { zone, .. }
            | ZoneEvent::SwitchChanged { zone, .. } => Some(*zone),
            ZoneEvent::Connected | ZoneEvent::Disconnected | ZoneEvent::Reconnecting { .. } => None,
        }
    }
}
