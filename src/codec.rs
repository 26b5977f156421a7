//! Request frames and response decoders for the hand controller protocol.
//!
//! Every request is a single command character followed by an optional
//! payload. Every response ends with a `#` terminator, which is checked and
//! stripped before the payload is decoded.
//!
//! All functions here are pure. The caller writes [`Command::encode`] to the
//! channel, reads up to [`Command::response_len`] bytes back, and hands them
//! to the matching `decode_*` function.
//!
//! # Command table
//!
//! | Command | Coarse | Precise | Payload | Reply |
//! |---------|--------|---------|---------|-------|
//! | Get RA/Dec | `E` | `e` | - | `XXXX,XXXX#` / `XXXXXXXX,XXXXXXXX#` |
//! | Get Azm/Alt | `Z` | `z` | - | as above |
//! | Goto RA/Dec | `R` | `r` | position pair | `#` |
//! | Goto Azm/Alt | `B` | `b` | position pair | `#` |
//! | Sync RA/Dec | `S` | `s` | position pair | `#` |
//! | Set tracking | `T` | | mode byte 0-3 | `#` |
//! | Is slewing | `L` | | - | `0#` / `1#` |
//! | Cancel goto | `M` | | - | `#` |
//! | Version | `V` | | - | major, minor bytes + `#` |
//! | Model | `m` | | - | model byte + `#` |
//! | Echo | `K` | | any byte | same byte + `#` |
//! | Alignment complete | `J` | | - | 0/1 byte + `#` |
//! | Pier side | `p` | | - | `E#` / `W#` |
//!
//! # Example
//!
//! ```rust
//! use synscan_mount::codec::{decode_position, Command};
//! use synscan_mount::{Equatorial, PrecisionMode};
//!
//! let goto = Command::GotoRaDec(PrecisionMode::Coarse, Equatorial::new(180.0, 90.0));
//! assert_eq!(goto.encode(), b"R8000,4000");
//!
//! let (ra, dec) = decode_position(b"8000,4000#", PrecisionMode::Coarse).unwrap();
//! assert_eq!((ra, dec), (180.0, 90.0));
//! ```

use core::fmt;

use crate::coords::{degrees_to_hex16, degrees_to_hex24, parse_hex16, parse_hex24};
use crate::coords::{Equatorial, Horizontal};
use crate::error::{MountError, Result};
use crate::state::{PrecisionMode, TrackingMode};

/// Byte that terminates every response.
pub const TERMINATOR: u8 = b'#';

/// Length of a coarse position reply, `XXXX,XXXX#`.
pub const COARSE_POSITION_LEN: usize = 10;

/// Length of a precise position reply, `XXXXXXXX,XXXXXXXX#`.
pub const PRECISE_POSITION_LEN: usize = 18;

/// Length of a bare acknowledgement, `#`.
pub const ACK_LEN: usize = 1;

/// A single request to the hand controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Query current RA/Dec.
    GetRaDec(PrecisionMode),
    /// Query current Azm/Alt.
    GetAzmAlt(PrecisionMode),
    /// Slew to an RA/Dec target.
    GotoRaDec(PrecisionMode, Equatorial),
    /// Slew to an Azm/Alt target.
    GotoAzmAlt(PrecisionMode, Horizontal),
    /// Re-label the current position as the given RA/Dec.
    SyncRaDec(PrecisionMode, Equatorial),
    /// Set the tracking mode.
    SetTracking(TrackingMode),
    /// Ask whether a goto is in progress.
    IsSlewing,
    /// Abort a goto in progress.
    CancelGoto,
    /// Hand controller firmware version.
    GetVersion,
    /// Mount model identifier.
    GetModel,
    /// Round-trip a byte through the hand controller.
    Echo(u8),
    /// Whether the alignment procedure was completed on the handset.
    IsAlignmentComplete,
    /// Which side of the pier the optical tube is on.
    GetPierSide,
}

impl Command {
    /// The command character sent first on the wire.
    pub const fn code(&self) -> u8 {
        use PrecisionMode::{Coarse, Precise};
        match self {
            Command::GetRaDec(Coarse) => b'E',
            Command::GetRaDec(Precise) => b'e',
            Command::GetAzmAlt(Coarse) => b'Z',
            Command::GetAzmAlt(Precise) => b'z',
            Command::GotoRaDec(Coarse, _) => b'R',
            Command::GotoRaDec(Precise, _) => b'r',
            Command::GotoAzmAlt(Coarse, _) => b'B',
            Command::GotoAzmAlt(Precise, _) => b'b',
            Command::SyncRaDec(Coarse, _) => b'S',
            Command::SyncRaDec(Precise, _) => b's',
            Command::SetTracking(_) => b'T',
            Command::IsSlewing => b'L',
            Command::CancelGoto => b'M',
            Command::GetVersion => b'V',
            Command::GetModel => b'm',
            Command::Echo(_) => b'K',
            Command::IsAlignmentComplete => b'J',
            Command::GetPierSide => b'p',
        }
    }

    /// Build the full request frame.
    pub fn encode(&self) -> Vec<u8> {
        let mut frame = vec![self.code()];
        match *self {
            Command::GotoRaDec(precision, Equatorial { ra, dec })
            | Command::SyncRaDec(precision, Equatorial { ra, dec }) => {
                frame.extend_from_slice(encode_pair(precision, ra, dec).as_bytes());
            }
            Command::GotoAzmAlt(precision, Horizontal { azm, alt }) => {
                frame.extend_from_slice(encode_pair(precision, azm, alt).as_bytes());
            }
            Command::SetTracking(mode) => frame.push(mode as u8),
            Command::Echo(byte) => frame.push(byte),
            _ => {}
        }
        frame
    }

    /// Maximum number of bytes in the reply, terminator included.
    pub const fn response_len(&self) -> usize {
        match self {
            Command::GetRaDec(PrecisionMode::Coarse) | Command::GetAzmAlt(PrecisionMode::Coarse) => {
                COARSE_POSITION_LEN
            }
            Command::GetRaDec(PrecisionMode::Precise)
            | Command::GetAzmAlt(PrecisionMode::Precise) => PRECISE_POSITION_LEN,
            Command::GotoRaDec(..)
            | Command::GotoAzmAlt(..)
            | Command::SyncRaDec(..)
            | Command::SetTracking(_)
            | Command::CancelGoto => ACK_LEN,
            Command::GetVersion => 3,
            Command::IsSlewing
            | Command::GetModel
            | Command::Echo(_)
            | Command::IsAlignmentComplete
            | Command::GetPierSide => 2,
        }
    }

    /// Whether the reply payload is raw bytes rather than ASCII text.
    ///
    /// A binary payload may itself contain `#`, so these replies must be
    /// read to their full [`response_len`](Self::response_len) instead of
    /// stopping at the first terminator byte.
    pub const fn binary_reply(&self) -> bool {
        matches!(
            self,
            Command::GetVersion
                | Command::GetModel
                | Command::Echo(_)
                | Command::IsAlignmentComplete
        )
    }
}

/// Encode a coordinate pair as `AAAA,BBBB` or `AAAAAA00,BBBBBB00`.
pub fn encode_pair(precision: PrecisionMode, first: f64, second: f64) -> String {
    match precision {
        PrecisionMode::Coarse => format!("{},{}", degrees_to_hex16(first), degrees_to_hex16(second)),
        PrecisionMode::Precise => {
            format!("{},{}", degrees_to_hex24(first), degrees_to_hex24(second))
        }
    }
}

// ============================================================================
// Response decoding
// ============================================================================

/// Check for and strip the trailing `#`.
pub fn strip_terminator(raw: &[u8]) -> Result<&[u8]> {
    match raw.split_last() {
        Some((&TERMINATOR, payload)) => Ok(payload),
        Some(_) => Err(MountError::ProtocolMismatch(format!(
            "unterminated response {:?}",
            String::from_utf8_lossy(raw)
        ))),
        None => Err(MountError::ProtocolMismatch("empty response".into())),
    }
}

fn ascii_payload(raw: &[u8]) -> Result<&str> {
    let payload = strip_terminator(raw)?;
    if !payload.is_ascii() {
        return Err(MountError::ProtocolMismatch(format!(
            "non-ASCII response {payload:?}"
        )));
    }
    core::str::from_utf8(payload)
        .map_err(|_| MountError::ProtocolMismatch(format!("non-ASCII response {payload:?}")))
}

fn fixed_payload<const N: usize>(raw: &[u8]) -> Result<[u8; N]> {
    let payload = strip_terminator(raw)?;
    payload.try_into().map_err(|_| {
        MountError::ProtocolMismatch(format!(
            "expected {N} byte reply, got {}",
            payload.len()
        ))
    })
}

/// Decode a bare `#` acknowledgement.
pub fn decode_ack(raw: &[u8]) -> Result<()> {
    fixed_payload::<0>(raw).map(|_| ())
}

/// Decode a position reply into a pair of angles in degrees.
///
/// Precise replies carry 8 hex digits per field; the last two are dropped.
pub fn decode_position(raw: &[u8], precision: PrecisionMode) -> Result<(f64, f64)> {
    let payload = ascii_payload(raw)?;
    let (first, second) = payload.split_once(',').ok_or_else(|| {
        MountError::ProtocolMismatch(format!("position reply without comma: {payload:?}"))
    })?;

    let parse = match precision {
        PrecisionMode::Coarse => parse_hex16,
        PrecisionMode::Precise => parse_hex24,
    };
    Ok((parse(first)?, parse(second)?))
}

/// Decode the `L` reply. Any nonzero integer means a goto is running.
pub fn decode_slewing(raw: &[u8]) -> Result<bool> {
    let payload = ascii_payload(raw)?;
    payload
        .trim()
        .parse::<u32>()
        .map(|n| n != 0)
        .map_err(|_| MountError::ProtocolMismatch(format!("slewing flag {payload:?}")))
}

/// Hand controller firmware version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FirmwareVersion {
    /// Major version.
    pub major: u8,
    /// Minor version.
    pub minor: u8,
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Decode the `V` reply.
pub fn decode_version(raw: &[u8]) -> Result<FirmwareVersion> {
    let [major, minor] = fixed_payload::<2>(raw)?;
    Ok(FirmwareVersion { major, minor })
}

/// Decode the `m` reply into the raw model identifier.
pub fn decode_model(raw: &[u8]) -> Result<u8> {
    fixed_payload::<1>(raw).map(|[model]| model)
}

/// Decode the `K` reply and check it matches what was sent.
pub fn decode_echo(raw: &[u8], sent: u8) -> Result<()> {
    let [byte] = fixed_payload::<1>(raw)?;
    if byte == sent {
        Ok(())
    } else {
        Err(MountError::ProtocolMismatch(format!(
            "echo mismatch: sent {sent:#04x}, got {byte:#04x}"
        )))
    }
}

/// Decode a single-byte boolean reply such as `J`.
pub fn decode_flag(raw: &[u8]) -> Result<bool> {
    fixed_payload::<1>(raw).map(|[flag]| flag != 0)
}

/// Side of the pier the optical tube is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PierSide {
    /// Tube east of the pier.
    East,
    /// Tube west of the pier.
    West,
}

/// Decode the `p` reply.
pub fn decode_pier_side(raw: &[u8]) -> Result<PierSide> {
    match fixed_payload::<1>(raw)? {
        [b'E'] => Ok(PierSide::East),
        [b'W'] => Ok(PierSide::West),
        [other] => Err(MountError::ProtocolMismatch(format!(
            "pier side {:?}",
            char::from(other)
        ))),
    }
}
