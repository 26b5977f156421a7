//! Configuration for the serial link and the controller.
//!
//! Port paths are held in a `heapless::String` so a config value is a plain
//! fixed-size struct that can be copied around freely.
//!
//! # Example
//!
//! ```rust
//! use synscan_mount::config::{Config, MirrorSettle, MountConfig, SerialConfig};
//! use synscan_mount::PointingMode;
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.serial.port.as_str(), "/dev/ttyUSB0");
//!
//! // Or customize
//! let config = Config::default()
//!     .with_serial(SerialConfig::default().with_port("/dev/ttyACM0"))
//!     .with_mount(
//!         MountConfig::default()
//!             .with_pointing(PointingMode::Mirror)
//!             .with_settle(MirrorSettle::poll(500, 120)),
//!     );
//! ```

use heapless::String as HString;

use crate::state::{PointingMode, PrecisionMode};

/// Maximum length for short config strings (device paths)
pub const MAX_SHORT_STRING: usize = 64;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Create a ShortString from a &str, truncating at a char boundary if too long
pub fn short_string(s: &str) -> ShortString {
    let mut end = s.len().min(MAX_SHORT_STRING);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    let mut hs = ShortString::new();
    // Cannot fail: end <= capacity
    let _ = hs.push_str(&s[..end]);
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Serial link configuration
    pub serial: SerialConfig,
    /// Controller behaviour
    pub mount: MountConfig,
}

impl Config {
    /// Set serial configuration
    pub fn with_serial(mut self, serial: SerialConfig) -> Self {
        self.serial = serial;
        self
    }

    /// Set mount configuration
    pub fn with_mount(mut self, mount: MountConfig) -> Self {
        self.mount = mount;
        self
    }
}

// ============================================================================
// Serial Config
// ============================================================================

/// Serial link configuration.
///
/// The hand controller always talks 8N1; only the path, speed, and read
/// timeout are configurable.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SerialConfig {
    /// Device path
    pub port: ShortString,
    /// Baud rate
    pub baud: u32,
    /// Read timeout in milliseconds
    pub timeout_ms: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: short_string("/dev/ttyUSB0"),
            baud: 9600,
            timeout_ms: 5000,
        }
    }
}

impl SerialConfig {
    /// Set the device path
    pub fn with_port(mut self, port: &str) -> Self {
        self.port = short_string(port);
        self
    }

    /// Set the baud rate
    pub fn with_baud(mut self, baud: u32) -> Self {
        self.baud = baud;
        self
    }

    /// Set the read timeout
    pub fn with_timeout_ms(mut self, ms: u32) -> Self {
        self.timeout_ms = ms;
        self
    }
}

// ============================================================================
// Mount Config
// ============================================================================

/// What to do between an RA/Dec goto and the mirror altitude correction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MirrorSettle {
    /// Read the position straight away, while the mount may still be moving.
    #[default]
    Immediate,
    /// Poll `L` until the mount reports idle.
    PollUntilIdle {
        /// Pause between polls in milliseconds
        interval_ms: u32,
        /// Polls before giving up with a timeout
        max_polls: u32,
    },
}

impl MirrorSettle {
    /// Shorthand for [`PollUntilIdle`](Self::PollUntilIdle).
    pub const fn poll(interval_ms: u32, max_polls: u32) -> Self {
        MirrorSettle::PollUntilIdle {
            interval_ms,
            max_polls,
        }
    }
}

/// Controller configuration
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MountConfig {
    /// Precision used for gotos, syncs, and queries at startup
    pub precision: PrecisionMode,
    /// Optical configuration at startup
    pub pointing: PointingMode,
    /// Wait policy before the mirror correction pass
    pub settle: MirrorSettle,
    /// Interval between reconnect attempts while disconnected, in milliseconds
    pub reconnect_interval_ms: u32,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            precision: PrecisionMode::Coarse,
            pointing: PointingMode::Telescope,
            settle: MirrorSettle::Immediate,
            reconnect_interval_ms: 10_000,
        }
    }
}

impl MountConfig {
    /// Set the startup precision
    pub fn with_precision(mut self, precision: PrecisionMode) -> Self {
        self.precision = precision;
        self
    }

    /// Set the startup pointing mode
    pub fn with_pointing(mut self, pointing: PointingMode) -> Self {
        self.pointing = pointing;
        self
    }

    /// Set the mirror settle policy
    pub fn with_settle(mut self, settle: MirrorSettle) -> Self {
        self.settle = settle;
        self
    }

    /// Set the reconnect interval
    pub fn with_reconnect_interval_ms(mut self, ms: u32) -> Self {
        self.reconnect_interval_ms = ms;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
