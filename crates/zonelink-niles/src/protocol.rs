//! Niles ZR wire codec.
//!
//! The ZR receivers speak a comma-separated ASCII protocol over the serial
//! link. Commands are short lowercase keywords with numeric parameters,
//! terminated with a carriage return. The receiver's replies use the same
//! shape, terminated with CR (sometimes CR-LF depending on firmware).
//!
//! # Command format
//!
//! ```text
//! znc,4,<zone>\r          activate a zone for control
//! znc,5\r                 query status of the active zone
//! zsc,<zone>,<function>\r zone function (source select, power off, mute, volume step)
//! znt,10,h\r              all zones off
//! src,11,<station>\r      tune the built-in tuner
//! ```
//!
//! # Response format
//!
//! Two line shapes are recognized, case-insensitively:
//!
//! ```text
//! usc,2,<zone>,<source>,<on 0|1>,<volume>,<mute 0|1>,<bass>,<treble>
//! rznc,4,<zone>
//! ```
//!
//! The receiver is chatty and firmware revisions differ in what else they
//! echo, so anything that is not one of these two shapes is skipped
//! silently -- an unrecognized line is never an error.

use bytes::{BufMut, BytesMut};

/// Command terminator byte.
pub const TERMINATOR: u8 = b'\r';

/// A parsed zone status line.
///
/// Fields other than `powered_on` are unreliable while the zone reports
/// powered off; the reconciler masks them (see the receiver driver).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneStatus {
    /// Zone number the status refers to.
    pub zone: u8,
    /// Selected source (1-6).
    pub source: u8,
    /// Whether the zone is powered on.
    pub powered_on: bool,
    /// Volume level (0-38).
    pub volume: u8,
    /// Whether the zone is muted.
    pub muted: bool,
    /// Bass level.
    pub bass: u8,
    /// Treble level.
    pub treble: u8,
}

/// A decoded reply from the receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseEvent {
    /// A zone status line (`usc,2,...`).
    ZoneStatus(ZoneStatus),
    /// Acknowledgment that a zone is now active for control (`rznc,4,<zone>`).
    ZoneActivated {
        /// The newly active zone.
        zone: u8,
    },
}

/// Result of attempting to decode one reply line from a byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    /// A recognized reply line was decoded.
    Event {
        /// The decoded event.
        event: ResponseEvent,
        /// Number of bytes consumed from the input buffer (including the
        /// line terminator).
        consumed: usize,
    },

    /// A complete line was found but not recognized; skip it.
    ///
    /// The `usize` is the number of bytes to discard.
    Skip(usize),

    /// The buffer holds no complete line yet. More data is needed.
    Incomplete,
}

/// Encode one command line: the body plus the CR terminator.
fn encode_line(body: &str) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(body.len() + 1);
    buf.put_slice(body.as_bytes());
    buf.put_u8(TERMINATOR);
    buf.to_vec()
}

/// Encode an "activate zone for control" command (`znc,4,<zone>\r`).
pub fn encode_activate_zone(zone: u8) -> Vec<u8> {
    encode_line(&format!("znc,4,{zone}"))
}

/// Encode a "query status of the active zone" command (`znc,5\r`).
pub fn encode_query_status() -> Vec<u8> {
    encode_line("znc,5")
}

/// Encode a zone function command (`zsc,<zone>,<code>\r`).
///
/// Function codes: 1-6 select a source (powering the zone on), 10 powers
/// off, 11 toggles mute, 12/13 step the volume up/down. See
/// [`commands::Function`](crate::commands::Function) for the typed wrapper.
pub fn encode_zone_function(zone: u8, code: u8) -> Vec<u8> {
    encode_line(&format!("zsc,{zone},{code}"))
}

/// Encode the "all zones off" command (`znt,10,h\r`).
pub fn encode_all_zones_off() -> Vec<u8> {
    encode_line("znt,10,h")
}

/// Encode a "tune the built-in tuner" command (`src,11,<station>\r`).
///
/// The station is passed through verbatim: FM stations use `###.#`
/// (e.g. `101.1`), AM stations use `####` (e.g. `1010`).
pub fn encode_tune_station(station: &str) -> Vec<u8> {
    encode_line(&format!("src,11,{station}"))
}

/// Encode an arbitrary command body, appending the CR terminator.
pub fn encode_raw(command: &str) -> Vec<u8> {
    encode_line(command)
}

/// Attempt to decode one reply line from a byte buffer.
///
/// Scans for a CR or LF terminator. Returns [`DecodeResult::Event`] with
/// the number of bytes consumed when the line matches a known reply shape,
/// [`DecodeResult::Skip`] for complete-but-unrecognized lines (including
/// the empty lines a CR-LF pair produces), or [`DecodeResult::Incomplete`]
/// when no terminator is present yet -- a partial line at a buffer
/// boundary stays put until the rest arrives.
pub fn decode_response(buf: &[u8]) -> DecodeResult {
    if buf.is_empty() {
        return DecodeResult::Incomplete;
    }

    let term_pos = match buf.iter().position(|&b| b == b'\r' || b == b'\n') {
        Some(pos) => pos,
        None => return DecodeResult::Incomplete,
    };

    let consumed = term_pos + 1;

    let line = match std::str::from_utf8(&buf[..term_pos]) {
        Ok(s) => s.trim(),
        Err(_) => return DecodeResult::Skip(consumed),
    };

    if line.is_empty() {
        return DecodeResult::Skip(consumed);
    }

    match parse_line(line) {
        Some(event) => DecodeResult::Event { event, consumed },
        None => DecodeResult::Skip(consumed),
    }
}

/// Drain all complete lines from a buffer, returning the recognized events
/// in wire order.
///
/// Skipped lines are discarded; an incomplete trailing line is left in the
/// buffer for the next read cycle.
pub fn decode_all(buf: &mut Vec<u8>) -> Vec<ResponseEvent> {
    let mut events = Vec::new();
    loop {
        match decode_response(buf) {
            DecodeResult::Event { event, consumed } => {
                buf.drain(..consumed);
                events.push(event);
            }
            DecodeResult::Skip(consumed) => {
                buf.drain(..consumed);
            }
            DecodeResult::Incomplete => break,
        }
    }
    events
}

/// Parse one complete, trimmed line into a reply event.
///
/// Matching is case-insensitive. Returns `None` for anything that is not
/// exactly a zone-status or zone-activated line.
fn parse_line(line: &str) -> Option<ResponseEvent> {
    let lower = line.to_ascii_lowercase();
    let fields: Vec<&str> = lower.split(',').map(str::trim).collect();

    match fields.as_slice() {
        ["usc", "2", zone, source, on_off, volume, mute, bass, treble] => {
            Some(ResponseEvent::ZoneStatus(ZoneStatus {
                zone: zone.parse().ok()?,
                source: source.parse().ok()?,
                powered_on: parse_flag(on_off)?,
                volume: volume.parse().ok()?,
                muted: parse_flag(mute)?,
                bass: bass.parse().ok()?,
                treble: treble.parse().ok()?,
            }))
        }
        ["rznc", "4", zone] => Some(ResponseEvent::ZoneActivated {
            zone: zone.parse().ok()?,
        }),
        _ => None,
    }
}

/// Parse a strict 0/1 flag field.
fn parse_flag(field: &str) -> Option<bool> {
    match field {
        "0" => Some(false),
        "1" => Some(true),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---------------------------------------------------------------
    // Command encoding
    // ---------------------------------------------------------------

    #[test]
    fn encode_activate() {
        assert_eq!(encode_activate_zone(4), b"znc,4,4\r");
        assert_eq!(encode_activate_zone(18), b"znc,4,18\r");
    }

    #[test]
    fn encode_query() {
        assert_eq!(encode_query_status(), b"znc,5\r");
    }

    #[test]
    fn encode_function_codes() {
        assert_eq!(encode_zone_function(1, 3), b"zsc,1,3\r");
        assert_eq!(encode_zone_function(6, 10), b"zsc,6,10\r");
        assert_eq!(encode_zone_function(2, 11), b"zsc,2,11\r");
        assert_eq!(encode_zone_function(12, 12), b"zsc,12,12\r");
    }

    #[test]
    fn encode_all_off() {
        assert_eq!(encode_all_zones_off(), b"znt,10,h\r");
    }

    #[test]
    fn encode_tuner() {
        assert_eq!(encode_tune_station("101.1"), b"src,11,101.1\r");
        assert_eq!(encode_tune_station("1010"), b"src,11,1010\r");
    }

    #[test]
    fn encode_raw_appends_terminator() {
        assert_eq!(encode_raw("znt,10,h"), b"znt,10,h\r");
    }

    // ---------------------------------------------------------------
    // Response decoding -- recognized lines
    // ---------------------------------------------------------------

    #[test]
    fn decode_zone_status() {
        let buf = b"usc,2,1,2,1,10,0,5,5\r";
        match decode_response(buf) {
            DecodeResult::Event { event, consumed } => {
                assert_eq!(consumed, buf.len());
                assert_eq!(
                    event,
                    ResponseEvent::ZoneStatus(ZoneStatus {
                        zone: 1,
                        source: 2,
                        powered_on: true,
                        volume: 10,
                        muted: false,
                        bass: 5,
                        treble: 5,
                    })
                );
            }
            other => panic!("expected Event, got {other:?}"),
        }
    }

    #[test]
    fn decode_zone_status_powered_off() {
        let buf = b"usc,2,3,1,0,0,0,0,0\r";
        match decode_response(buf) {
            DecodeResult::Event {
                event: ResponseEvent::ZoneStatus(status),
                ..
            } => {
                assert_eq!(status.zone, 3);
                assert!(!status.powered_on);
            }
            other => panic!("expected ZoneStatus, got {other:?}"),
        }
    }

    #[test]
    fn decode_zone_activated() {
        let buf = b"rznc,4,7\r";
        match decode_response(buf) {
            DecodeResult::Event { event, consumed } => {
                assert_eq!(consumed, 9);
                assert_eq!(event, ResponseEvent::ZoneActivated { zone: 7 });
            }
            other => panic!("expected Event, got {other:?}"),
        }
    }

    #[test]
    fn decode_is_case_insensitive() {
        let buf = b"USC,2,1,2,1,10,0,5,5\r";
        assert!(matches!(
            decode_response(buf),
            DecodeResult::Event {
                event: ResponseEvent::ZoneStatus(_),
                ..
            }
        ));

        let buf = b"RZNC,4,2\r";
        assert!(matches!(
            decode_response(buf),
            DecodeResult::Event {
                event: ResponseEvent::ZoneActivated { zone: 2 },
                ..
            }
        ));
    }

    #[test]
    fn decode_accepts_lf_terminator() {
        let buf = b"rznc,4,5\n";
        assert!(matches!(
            decode_response(buf),
            DecodeResult::Event {
                event: ResponseEvent::ZoneActivated { zone: 5 },
                ..
            }
        ));
    }

    // ---------------------------------------------------------------
    // Response decoding -- skip and edge cases
    // ---------------------------------------------------------------

    #[test]
    fn decode_incomplete_without_terminator() {
        assert_eq!(decode_response(b"usc,2,1,2,1,10"), DecodeResult::Incomplete);
        assert_eq!(decode_response(b""), DecodeResult::Incomplete);
    }

    #[test]
    fn decode_skips_unrecognized_line() {
        assert_eq!(decode_response(b"hello,world\r"), DecodeResult::Skip(12));
    }

    #[test]
    fn decode_skips_empty_line() {
        // The LF of a CR-LF pair shows up as an empty line.
        assert_eq!(decode_response(b"\n"), DecodeResult::Skip(1));
    }

    #[test]
    fn decode_skips_wrong_field_count() {
        // usc,2 line with a missing field.
        assert_eq!(
            decode_response(b"usc,2,1,2,1,10,0,5\r"),
            DecodeResult::Skip(19)
        );
    }

    #[test]
    fn decode_skips_non_numeric_fields() {
        assert_eq!(
            decode_response(b"usc,2,x,2,1,10,0,5,5\r"),
            DecodeResult::Skip(21)
        );
        // The on/off flag must be exactly 0 or 1.
        assert_eq!(
            decode_response(b"usc,2,1,2,2,10,0,5,5\r"),
            DecodeResult::Skip(21)
        );
    }

    #[test]
    fn decode_skips_invalid_utf8() {
        assert_eq!(decode_response(b"\xFF\xFE\r"), DecodeResult::Skip(3));
    }

    // ---------------------------------------------------------------
    // Buffer draining
    // ---------------------------------------------------------------

    #[test]
    fn decode_all_multiple_replies_in_one_read() {
        let mut buf = b"usc,2,1,2,1,10,0,5,5\rrznc,4,3\r".to_vec();
        let events = decode_all(&mut buf);

        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            ResponseEvent::ZoneStatus(s) if s.zone == 1
        ));
        assert_eq!(events[1], ResponseEvent::ZoneActivated { zone: 3 });
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_all_preserves_partial_tail() {
        let mut buf = b"rznc,4,3\rusc,2,1,2".to_vec();
        let events = decode_all(&mut buf);

        assert_eq!(events, vec![ResponseEvent::ZoneActivated { zone: 3 }]);
        assert_eq!(buf, b"usc,2,1,2");

        // The rest of the line arrives in the next read.
        buf.extend_from_slice(b",1,10,0,5,5\r");
        let events = decode_all(&mut buf);
        assert_eq!(events.len(), 1);
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_all_discards_noise_between_replies() {
        let mut buf = b"garbage\rrznc,4,2\r\nnoise\r".to_vec();
        let events = decode_all(&mut buf);
        assert_eq!(events, vec![ResponseEvent::ZoneActivated { zone: 2 }]);
        assert!(buf.is_empty());
    }
}
