//! Channel implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `mock`: Scripted channel and simulated mount for tests
//! - `serial`: Serial port channel (requires `serial` feature)

pub mod mock;

#[cfg(feature = "serial")]
pub mod serial;

pub use mock::*;

#[cfg(feature = "serial")]
pub use serial::*;
