//! Zone function command builders and input validation.
//!
//! This module provides the semantic layer over the wire codec: typed
//! [`Function`] codes, builders for the common zone operations, and the
//! range validators applied to caller input before anything is enqueued.
//!
//! All builders are pure -- they produce byte vectors without performing
//! any I/O. The receiver driver enqueues the bytes and the worker loop
//! sends them.
//!
//! # Volume stepping
//!
//! The protocol has no absolute-volume command; volume moves one step at a
//! time via function codes 12 (up) and 13 (down). [`volume_steps`]
//! computes the direction and step count needed to move from the current
//! level to a target, which the driver turns into a repeated paced write.

use zonelink_core::error::{Error, Result};

use crate::models::NilesModel;
use crate::protocol;

/// A zone function code for the `zsc,<zone>,<code>` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    /// Select an input source (1-6). Also powers the zone on.
    SelectSource(u8),
    /// Power the zone off.
    PowerOff,
    /// Toggle the zone's mute state.
    MuteToggle,
    /// Step the volume up one increment.
    VolumeUp,
    /// Step the volume down one increment.
    VolumeDown,
}

impl Function {
    /// The numeric wire code for this function.
    pub fn code(&self) -> u8 {
        match self {
            Function::SelectSource(source) => *source,
            Function::PowerOff => 10,
            Function::MuteToggle => 11,
            Function::VolumeUp => 12,
            Function::VolumeDown => 13,
        }
    }
}

// ---------------------------------------------------------------
// Command builders
// ---------------------------------------------------------------

/// Build a "power on" command for a zone.
///
/// The protocol has no dedicated power-on function; selecting a source
/// powers the zone on, so this selects `source` (the zone's current or
/// desired input).
pub fn cmd_power_on(zone: u8, source: u8) -> Vec<u8> {
    protocol::encode_zone_function(zone, Function::SelectSource(source).code())
}

/// Build a "power off" command for a zone.
pub fn cmd_power_off(zone: u8) -> Vec<u8> {
    protocol::encode_zone_function(zone, Function::PowerOff.code())
}

/// Build a "select source" command for a zone (also powers it on).
pub fn cmd_select_source(zone: u8, source: u8) -> Vec<u8> {
    protocol::encode_zone_function(zone, Function::SelectSource(source).code())
}

/// Build a "toggle mute" command for a zone.
pub fn cmd_mute_toggle(zone: u8) -> Vec<u8> {
    protocol::encode_zone_function(zone, Function::MuteToggle.code())
}

/// Build a single "volume up" step for a zone.
pub fn cmd_volume_up(zone: u8) -> Vec<u8> {
    protocol::encode_zone_function(zone, Function::VolumeUp.code())
}

/// Build a single "volume down" step for a zone.
pub fn cmd_volume_down(zone: u8) -> Vec<u8> {
    protocol::encode_zone_function(zone, Function::VolumeDown.code())
}

// ---------------------------------------------------------------
// Volume helpers
// ---------------------------------------------------------------

/// Compute the stepping needed to move the volume from `current` to
/// `target`: the function to repeat and the number of repetitions.
///
/// Returns `None` when no movement is needed.
pub fn volume_steps(current: u8, target: u8) -> Option<(Function, u32)> {
    match target.cmp(&current) {
        std::cmp::Ordering::Equal => None,
        std::cmp::Ordering::Greater => Some((Function::VolumeUp, (target - current) as u32)),
        std::cmp::Ordering::Less => Some((Function::VolumeDown, (current - target) as u32)),
    }
}

/// Convert a 0-100 percentage to a volume level on the model's scale.
///
/// Truncates toward zero, so 100% is exactly the maximum volume and 0%
/// is silence.
pub fn volume_from_percent(percent: u8, model: &NilesModel) -> u8 {
    (percent as u16 * model.max_volume as u16 / 100) as u8
}

/// Convert a volume level to a 0-100 percentage on the model's scale.
///
/// Truncates toward zero; the inverse of [`volume_from_percent`] up to
/// rounding.
pub fn percent_from_volume(volume: u8, model: &NilesModel) -> u8 {
    (volume as u16 * 100 / model.max_volume as u16) as u8
}

// ---------------------------------------------------------------
// Input validation
// ---------------------------------------------------------------

/// Validate a zone number against the model's zone bound.
pub fn validate_zone(model: &NilesModel, zone: u8) -> Result<()> {
    if zone == 0 || zone > model.max_zones {
        return Err(Error::InvalidParameter(format!(
            "zone {zone} out of range 1-{} for {}",
            model.max_zones, model.name
        )));
    }
    Ok(())
}

/// Validate a source number against the model's source count.
pub fn validate_source(model: &NilesModel, source: u8) -> Result<()> {
    if source == 0 || source > model.source_count {
        return Err(Error::InvalidParameter(format!(
            "source {source} out of range 1-{}",
            model.source_count
        )));
    }
    Ok(())
}

/// Validate a volume level against the model's volume ceiling.
pub fn validate_volume(model: &NilesModel, volume: u8) -> Result<()> {
    if volume > model.max_volume {
        return Err(Error::InvalidParameter(format!(
            "volume {volume} out of range 0-{}",
            model.max_volume
        )));
    }
    Ok(())
}

/// Validate a tuner station string.
///
/// The wire format is opaque to the driver (FM `###.#` or AM `####`), so
/// only framing hazards are rejected: empty strings and characters that
/// would corrupt the comma-separated, CR-terminated line.
pub fn validate_station(station: &str) -> Result<()> {
    if station.trim().is_empty() {
        return Err(Error::InvalidParameter("station must not be empty".into()));
    }
    if station.contains([',', '\r', '\n']) {
        return Err(Error::InvalidParameter(format!(
            "station {station:?} contains protocol delimiter characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{zr_4, zr_6};

    // ---------------------------------------------------------------
    // Function codes
    // ---------------------------------------------------------------

    #[test]
    fn function_codes_match_protocol() {
        assert_eq!(Function::SelectSource(1).code(), 1);
        assert_eq!(Function::SelectSource(6).code(), 6);
        assert_eq!(Function::PowerOff.code(), 10);
        assert_eq!(Function::MuteToggle.code(), 11);
        assert_eq!(Function::VolumeUp.code(), 12);
        assert_eq!(Function::VolumeDown.code(), 13);
    }

    // ---------------------------------------------------------------
    // Builders
    // ---------------------------------------------------------------

    #[test]
    fn power_on_selects_source() {
        assert_eq!(cmd_power_on(3, 2), b"zsc,3,2\r");
    }

    #[test]
    fn power_off_uses_function_ten() {
        assert_eq!(cmd_power_off(3), b"zsc,3,10\r");
    }

    #[test]
    fn select_source_command() {
        assert_eq!(cmd_select_source(1, 6), b"zsc,1,6\r");
    }

    #[test]
    fn mute_toggle_command() {
        assert_eq!(cmd_mute_toggle(5), b"zsc,5,11\r");
    }

    #[test]
    fn volume_step_commands() {
        assert_eq!(cmd_volume_up(2), b"zsc,2,12\r");
        assert_eq!(cmd_volume_down(2), b"zsc,2,13\r");
    }

    // ---------------------------------------------------------------
    // Volume stepping
    // ---------------------------------------------------------------

    #[test]
    fn volume_steps_up() {
        assert_eq!(volume_steps(10, 30), Some((Function::VolumeUp, 20)));
        assert_eq!(volume_steps(0, 1), Some((Function::VolumeUp, 1)));
    }

    #[test]
    fn volume_steps_down() {
        assert_eq!(volume_steps(30, 10), Some((Function::VolumeDown, 20)));
        assert_eq!(volume_steps(38, 0), Some((Function::VolumeDown, 38)));
    }

    #[test]
    fn volume_steps_none_when_equal() {
        assert_eq!(volume_steps(15, 15), None);
        assert_eq!(volume_steps(0, 0), None);
    }

    #[test]
    fn percent_conversion() {
        let model = zr_6();
        assert_eq!(volume_from_percent(100, &model), 38);
        assert_eq!(volume_from_percent(50, &model), 19);
        assert_eq!(volume_from_percent(0, &model), 0);

        assert_eq!(percent_from_volume(38, &model), 100);
        assert_eq!(percent_from_volume(19, &model), 50);
        assert_eq!(percent_from_volume(0, &model), 0);
        // Truncation, matching the original's floor().
        assert_eq!(percent_from_volume(10, &model), 26);
    }

    // ---------------------------------------------------------------
    // Validation
    // ---------------------------------------------------------------

    #[test]
    fn zone_validation_respects_model_bound() {
        let model = zr_4();
        assert!(validate_zone(&model, 1).is_ok());
        assert!(validate_zone(&model, 4).is_ok());
        assert!(validate_zone(&model, 0).is_err());
        assert!(validate_zone(&model, 5).is_err());

        let model = zr_6();
        assert!(validate_zone(&model, 6).is_ok());
        assert!(validate_zone(&model, 7).is_err());
    }

    #[test]
    fn source_validation() {
        let model = zr_6();
        assert!(validate_source(&model, 1).is_ok());
        assert!(validate_source(&model, 6).is_ok());
        assert!(validate_source(&model, 0).is_err());
        assert!(validate_source(&model, 7).is_err());
    }

    #[test]
    fn volume_validation() {
        let model = zr_6();
        assert!(validate_volume(&model, 0).is_ok());
        assert!(validate_volume(&model, 38).is_ok());
        assert!(validate_volume(&model, 39).is_err());
    }

    #[test]
    fn station_validation() {
        assert!(validate_station("101.1").is_ok());
        assert!(validate_station("1010").is_ok());
        assert!(validate_station("").is_err());
        assert!(validate_station("   ").is_err());
        assert!(validate_station("101,1").is_err());
        assert!(validate_station("101\r").is_err());
    }

    #[test]
    fn validation_errors_are_invalid_parameter() {
        let model = zr_6();
        assert!(matches!(
            validate_zone(&model, 99),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            validate_volume(&model, 200),
            Err(Error::InvalidParameter(_))
        ));
    }
}
