//! Trait definitions for the byte channel the protocol runs over.
//!
//! # Submodules
//!
//! - `channel`: [`MountChannel`] and [`ChannelOpener`]
//!
//! The controller is generic over [`ChannelOpener`], so the same protocol
//! code drives a serial port, the in-memory mock, or the simulated mount.

pub mod channel;

pub use channel::*;
