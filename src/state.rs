//! Client-side mount state: precision, tracking, and pointing modes.
//!
//! None of this is read back from the hardware. Precision and pointing are
//! purely local choices, and the tracking mode is a mirror of the last mode
//! the mount acknowledged, because the hand controller has no reliable query
//! for it.

use crate::error::MountError;

/// Angle encoding resolution used for gotos, syncs, and position queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PrecisionMode {
    /// 16-bit encoding, uppercase commands.
    #[default]
    Coarse,
    /// 24-bit encoding, lowercase commands.
    Precise,
}

impl PrecisionMode {
    /// Returns the other mode.
    #[inline]
    pub const fn toggled(self) -> Self {
        match self {
            PrecisionMode::Coarse => PrecisionMode::Precise,
            PrecisionMode::Precise => PrecisionMode::Coarse,
        }
    }

    /// Returns true for [`Precise`](Self::Precise).
    #[inline]
    pub const fn is_precise(self) -> bool {
        matches!(self, PrecisionMode::Precise)
    }
}

/// Mount tracking mode, as sent with the `T` command.
///
/// # Example
///
/// ```rust
/// use synscan_mount::TrackingMode;
///
/// assert_eq!(TrackingMode::try_from(2u8), Ok(TrackingMode::Equatorial));
/// assert!(TrackingMode::try_from(4u8).is_err());
/// assert_eq!(TrackingMode::Pec as u8, 3);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum TrackingMode {
    /// Tracking off; the mount is idle.
    Off = 0,
    /// Alt/Az tracking.
    AltAz = 1,
    /// Equatorial (sidereal) tracking.
    Equatorial = 2,
    /// Sidereal tracking with periodic error correction.
    Pec = 3,
}

impl TrackingMode {
    /// All modes in protocol order.
    pub const ALL: [TrackingMode; 4] = [
        TrackingMode::Off,
        TrackingMode::AltAz,
        TrackingMode::Equatorial,
        TrackingMode::Pec,
    ];

    /// Lowercase display name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TrackingMode::Off => "off",
            TrackingMode::AltAz => "alt-az",
            TrackingMode::Equatorial => "equatorial",
            TrackingMode::Pec => "pec",
        }
    }
}

impl TryFrom<u8> for TrackingMode {
    type Error = MountError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        TrackingMode::ALL
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| {
                MountError::ArgumentError(format!(
                    "tracking mode {value} out of range; 0 = off, 1 = alt/az, 2 = equatorial, 3 = PEC"
                ))
            })
    }
}

/// Optical configuration the mount is pointing through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PointingMode {
    /// Direct pointing; gotos are sent as-is.
    #[default]
    Telescope,
    /// Folded through a mirror; RA/Dec gotos get an altitude correction pass.
    Mirror,
}

/// Snapshot of everything the controller tracks about the mount.
///
/// # Example
///
/// ```rust
/// use synscan_mount::{MountState, PrecisionMode};
///
/// let state = MountState::default();
/// assert!(!state.connected);
/// assert_eq!(state.precision, PrecisionMode::Coarse);
/// assert!(!state.is_stopped() && !state.is_tracking());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MountState {
    /// Whether a channel is currently open.
    pub connected: bool,
    /// Encoding used for gotos, syncs, and queries.
    pub precision: PrecisionMode,
    /// Last tracking mode the mount acknowledged, if any.
    ///
    /// This is the last *commanded* mode, not a confirmed hardware reading.
    pub tracking: Option<TrackingMode>,
    /// Optical pointing configuration.
    pub pointing: PointingMode,
}

impl MountState {
    /// Last tracking mode the mount acknowledged.
    #[inline]
    pub fn last_commanded_tracking(&self) -> Option<TrackingMode> {
        self.tracking
    }

    /// True if the last acknowledged tracking mode is [`TrackingMode::Off`].
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.tracking == Some(TrackingMode::Off)
    }

    /// True if the last acknowledged tracking mode is anything but off.
    ///
    /// False when no mode has ever been set.
    #[inline]
    pub fn is_tracking(&self) -> bool {
        matches!(self.tracking, Some(mode) if mode != TrackingMode::Off)
    }
}
