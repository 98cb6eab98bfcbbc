//! Niles ZR model definitions.
//!
//! Each supported chassis is described by a [`NilesModel`] struct that
//! captures its zone bound, source count, volume ceiling, and the default
//! serial baud rate. All chassis in the family speak the same protocol;
//! the only variation that matters to the driver is how many zones a
//! command may legally address.
//!
//! Models are defined as factory functions that return a fully populated
//! [`NilesModel`]:
//!
//! | Model            | Zones | Sources | Baud  |
//! |------------------|-------|---------|-------|
//! | ZR-4             | 4     | 6       | 38400 |
//! | ZR-6             | 6     | 6       | 38400 |
//! | ZR-6 (expanded)  | 18    | 6       | 38400 |

/// Static model definition for a Niles ZR receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NilesModel {
    /// Human-readable model name (e.g. "ZR-6").
    pub name: &'static str,
    /// Highest zone number a command may address (zones are 1-based).
    pub max_zones: u8,
    /// Number of selectable input sources.
    pub source_count: u8,
    /// Highest volume level; the scale is 0..=`max_volume`.
    pub max_volume: u8,
    /// Default serial baud rate for the control port.
    pub default_baud_rate: u32,
}

/// ZR-4 model definition: the four-zone chassis.
pub fn zr_4() -> NilesModel {
    NilesModel {
        name: "ZR-4",
        max_zones: 4,
        source_count: 6,
        max_volume: 38,
        default_baud_rate: 38_400,
    }
}

/// ZR-6 model definition: the six-zone chassis.
pub fn zr_6() -> NilesModel {
    NilesModel {
        name: "ZR-6",
        max_zones: 6,
        source_count: 6,
        max_volume: 38,
        default_baud_rate: 38_400,
    }
}

/// Expanded ZR-6 system: three linked chassis sharing one control port,
/// addressing zones 1-18.
pub fn zr_6_expanded() -> NilesModel {
    NilesModel {
        name: "ZR-6 (expanded)",
        max_zones: 18,
        source_count: 6,
        max_volume: 38,
        default_baud_rate: 38_400,
    }
}

/// Returns a list of all supported model definitions.
pub fn all_models() -> Vec<NilesModel> {
    vec![zr_4(), zr_6(), zr_6_expanded()]
}
