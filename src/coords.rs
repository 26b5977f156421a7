//! Coordinate conversion between decimal degrees, protocol hex payloads,
//! and human-entered sexagesimal text.
//!
//! The mount expresses every angle as a fraction of a full rotation encoded
//! in fixed-point hexadecimal:
//!
//! | Resolution | Digits on the wire | Scale |
//! |------------|--------------------|-------|
//! | 16-bit (coarse) | 4 | `deg / 360 * 65536` |
//! | 24-bit (precise) | 8 (last two always `00`) | `deg / 360 * 16777216` |
//!
//! Values outside `[0, 360)` wrap modulo one rotation, so a declination of
//! `-20°` goes out as `340°`. Use [`signed_degrees`] to map it back.
//!
//! # Example
//!
//! ```rust
//! use synscan_mount::coords::{degrees_to_hex16, hex16_to_degrees, parse_pretty_equatorial};
//!
//! assert_eq!(degrees_to_hex16(180.0), "8000");
//! assert_eq!(hex16_to_degrees(0x8000), 180.0);
//!
//! let target = parse_pretty_equatorial("12 30 00.0+45 30 00.0").unwrap();
//! assert_eq!((target.ra, target.dec), (187.5, 45.5));
//! ```

use crate::error::{MountError, Result};

/// Steps per rotation in 16-bit encoding.
pub const STEPS_16: f64 = 65_536.0;

/// Steps per rotation in 24-bit encoding.
pub const STEPS_24: f64 = 16_777_216.0;

/// Smallest angle the coarse encoding can express, in degrees.
pub const RESOLUTION_16: f64 = 360.0 / STEPS_16;

/// Smallest angle the precise encoding can express, in degrees.
pub const RESOLUTION_24: f64 = 360.0 / STEPS_24;

/// Equatorial coordinates in decimal degrees.
///
/// Right ascension is expressed in degrees rather than hours, as the mount
/// handles it as a fraction of a full rotation.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Equatorial {
    /// Right ascension in degrees, `[0, 360)`.
    pub ra: f64,
    /// Declination in degrees.
    pub dec: f64,
}

impl Equatorial {
    /// Creates a new equatorial coordinate pair.
    pub const fn new(ra: f64, dec: f64) -> Self {
        Self { ra, dec }
    }
}

/// Horizon-referenced coordinates in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Horizontal {
    /// Azimuth in degrees, `[0, 360)`.
    pub azm: f64,
    /// Altitude in degrees.
    pub alt: f64,
}

impl Horizontal {
    /// Creates a new horizontal coordinate pair.
    pub const fn new(azm: f64, alt: f64) -> Self {
        Self { azm, alt }
    }
}

// ============================================================================
// Fixed-point hex encoding
// ============================================================================

/// Scale degrees to protocol steps, wrapping modulo one rotation.
///
/// Non-finite input saturates to zero rather than panicking.
fn degrees_to_steps(deg: f64, steps: f64) -> u32 {
    let raw = (deg / 360.0 * steps).round() as i64;
    raw.rem_euclid(steps as i64) as u32
}

/// Encode degrees as 4 uppercase hex digits (16-bit).
pub fn degrees_to_hex16(deg: f64) -> String {
    format!("{:04X}", degrees_to_steps(deg, STEPS_16))
}

/// Encode degrees as 8 uppercase hex digits (24-bit).
///
/// The six significant digits are followed by a literal `00`: the low byte
/// of the 32-bit field carries no information on this mount.
pub fn degrees_to_hex24(deg: f64) -> String {
    format!("{:06X}00", degrees_to_steps(deg, STEPS_24))
}

/// Decode a 16-bit step count to degrees.
pub fn hex16_to_degrees(raw: u32) -> f64 {
    f64::from(raw & 0xFFFF) / STEPS_16 * 360.0
}

/// Decode a 24-bit step count (low byte already dropped) to degrees.
pub fn hex24_to_degrees(raw: u32) -> f64 {
    f64::from(raw & 0x00FF_FFFF) / STEPS_24 * 360.0
}

fn parse_hex_digits(field: &str) -> Result<u32> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(MountError::ProtocolMismatch(format!(
            "not a hex field: {field:?}"
        )));
    }
    u32::from_str_radix(field, 16)
        .map_err(|e| MountError::ProtocolMismatch(format!("{field:?}: {e}")))
}

/// Parse a 4-digit coarse position field into degrees.
pub fn parse_hex16(field: &str) -> Result<f64> {
    if field.len() != 4 {
        return Err(MountError::ProtocolMismatch(format!(
            "expected 4 hex digits, got {field:?}"
        )));
    }
    parse_hex_digits(field).map(hex16_to_degrees)
}

/// Parse an 8-digit precise position field into degrees.
///
/// The trailing two digits are discarded before conversion.
pub fn parse_hex24(field: &str) -> Result<f64> {
    if field.len() != 8 {
        return Err(MountError::ProtocolMismatch(format!(
            "expected 8 hex digits, got {field:?}"
        )));
    }
    let high = field.get(..6).ok_or_else(|| {
        MountError::ProtocolMismatch(format!("expected 8 hex digits, got {field:?}"))
    })?;
    parse_hex_digits(high).map(hex24_to_degrees)
}

// ============================================================================
// Angle helpers
// ============================================================================

/// Wrap an angle into `[0, 360)`.
pub fn wrap_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Map an angle into `(-180, 180]`.
///
/// The mount reports southern declinations and negative altitudes as
/// `360 - x`; this recovers the signed value.
pub fn signed_degrees(deg: f64) -> f64 {
    let wrapped = wrap_degrees(deg);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

// ============================================================================
// Text input / output
// ============================================================================

fn sexagesimal_fields(part: &str, what: &str) -> Result<[f64; 3]> {
    let fields: Vec<&str> = part
        .split(|c: char| c.is_whitespace() || c == ':')
        .filter(|s| !s.is_empty())
        .collect();

    if fields.len() != 3 {
        return Err(MountError::InvalidCoordinates(format!(
            "{what} needs 3 fields, got {}",
            fields.len()
        )));
    }

    let mut out = [0.0; 3];
    for (slot, field) in out.iter_mut().zip(&fields) {
        *slot = field.parse().map_err(|_| {
            MountError::InvalidCoordinates(format!("{what} field {field:?} is not a number"))
        })?;
    }
    Ok(out)
}

/// Parse `"hh mm ss.s[+|-]dd mm ss.s"` into degrees.
///
/// Right ascension is read in hours and converted to degrees. The sign
/// between the two triplets applies to the whole declination, so
/// `"... -10 30 00"` is `-10.5°`. Colons are accepted in place of spaces.
///
/// # Example
///
/// ```rust
/// use synscan_mount::coords::parse_pretty_equatorial;
///
/// let south = parse_pretty_equatorial("05 35 17.3-05 23 28.0").unwrap();
/// assert!(south.dec < 0.0);
/// ```
pub fn parse_pretty_equatorial(text: &str) -> Result<Equatorial> {
    let text = text.trim();
    let sign_at = text
        .find(['+', '-'])
        .ok_or_else(|| MountError::InvalidCoordinates("missing +/- before declination".into()))?;

    let (ra_part, rest) = text.split_at(sign_at);
    let south = rest.starts_with('-');
    let dec_part = &rest[1..];

    let [hh, mm, ss] = sexagesimal_fields(ra_part, "right ascension")?;
    let [dd, dm, ds] = sexagesimal_fields(dec_part, "declination")?;

    // 1h of right ascension is exactly 15 degrees
    let ra = (hh + mm / 60.0 + ss / 3600.0) * 15.0;
    let dec = dd + dm / 60.0 + ds / 3600.0;

    Ok(Equatorial {
        ra,
        dec: if south { -dec } else { dec },
    })
}

fn format_sexagesimal(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let value = value.abs();
    let whole = value.trunc();
    let minutes = (value - whole) * 60.0;
    let seconds = (minutes - minutes.trunc()) * 60.0;
    format!(
        "{sign}{:02} : {:02} : {:.2}",
        whole as u64,
        minutes.trunc() as u64,
        seconds
    )
}

/// Format decimal degrees for display as `("HH : MM : SS.ss", "DD : MM : SS.ss")`.
///
/// Hours and minutes are truncated and zero-padded; seconds keep two
/// decimals without padding. A negative declination carries a single
/// leading `-`.
pub fn format_pretty_equatorial(ra: f64, dec: f64) -> (String, String) {
    (format_sexagesimal(ra / 15.0), format_sexagesimal(dec))
}

/// Parse a bare `"azm,alt"` pair of decimal degrees.
pub fn parse_azm_alt(text: &str) -> Result<Horizontal> {
    let mut parts = text.split(',');
    let (Some(azm), Some(alt), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(MountError::InvalidCoordinates(format!(
            "expected \"azm,alt\", got {text:?}"
        )));
    };

    let parse = |field: &str| {
        field.trim().parse::<f64>().map_err(|_| {
            MountError::InvalidCoordinates(format!("{:?} is not a number", field.trim()))
        })
    };

    Ok(Horizontal {
        azm: parse(azm)?,
        alt: parse(alt)?,
    })
}
