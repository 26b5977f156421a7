//! # synscan-mount
//!
//! A serial protocol client for SynScan / NexStar style goto mounts, with
//! support for pointing through a flat mirror.
//!
//! ## Features
//!
//! - **Channel abstraction**: Traits for the byte link, with a serial port
//!   implementation and mocks for testing
//! - **Coarse and precise encoding**: 16-bit and 24-bit fixed-point angles
//! - **Client-side state**: Precision, pointing, and last commanded tracking mode
//! - **Mirror pointing**: Altitude correction pass after RA/Dec gotos
//! - **Recovery**: Reconnect on demand, stale input flushed after timeouts
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without a mount:
//!
//! - `traits` - Byte channel abstractions
//! - `coords` - Degree, hex, and sexagesimal conversions
//! - `codec` - Request frames and response decoders
//! - `state` - Client-side mount state
//! - `controller` - Main controller that ties everything together
//! - `hal` - Concrete channels (mock and simulated mount for testing, serial for hardware)
//!
//! ## Example
//!
//! ```rust
//! use synscan_mount::{
//!     MountController, Equatorial, TrackingMode,
//!     hal::SimulatedMount,
//! };
//!
//! // Create controller against a simulated hand controller
//! let mut mount = MountController::new(SimulatedMount::new());
//!
//! // Goto from text input, then start tracking
//! mount.goto_ra_dec_text("05 35 17.3-05 23 28.0").unwrap();
//! mount.set_tracking(TrackingMode::Equatorial).unwrap();
//!
//! // Read back the position for display
//! let here = mount.ra_dec().unwrap();
//! let (ra, dec) = synscan_mount::coords::format_pretty_equatorial(here.ra, here.dec);
//! println!("RA {ra}  Dec {dec}");
//! ```

#![warn(missing_docs)]

/// Request frames and response decoders.
pub mod codec;
/// Serial and controller configuration.
pub mod config;
/// Main mount controller that coordinates the channel, codec, and state.
pub mod controller;
/// Coordinate conversion between degrees, protocol hex, and text.
pub mod coords;
/// Error types.
pub mod error;
/// Channel implementations: mocks for testing, serial port for hardware.
pub mod hal;
/// Client-side mount state.
pub mod state;
/// Core traits for the byte channel.
pub mod traits;

// Re-exports for convenience
pub use codec::{Command, FirmwareVersion, PierSide};
pub use controller::{mirror_altitude, MountController};
pub use coords::{Equatorial, Horizontal};
pub use error::{ChannelError, MountError, Result};
pub use state::{MountState, PointingMode, PrecisionMode, TrackingMode};
pub use traits::{ChannelOpener, MountChannel};

// Config re-exports
pub use config::{Config, MirrorSettle, MountConfig, SerialConfig};
