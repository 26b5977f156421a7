//! Byte channel abstraction between the controller and the hand controller.
//!
//! The protocol engine only needs a blocking, half-duplex byte pipe: write a
//! request, read a bounded reply. This module defines that contract so the
//! controller can run against a real serial port, an in-memory mock, or a
//! simulated mount.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`MountChannel`] | An open link: write, bounded read, flush, close |
//! | [`ChannelOpener`] | Factory that (re)opens a link on demand |
//!
//! # Implementation
//!
//! For testing, use [`MockOpener`] or [`SimulatedMount`] from
//! [`crate::hal::mock`]. For hardware, use `hal::serial::SerialOpener`
//! (requires the `serial` feature).
//!
//! # Example
//!
//! ```rust
//! use synscan_mount::traits::{ChannelOpener, MountChannel};
//! use synscan_mount::hal::MockOpener;
//!
//! let mut opener = MockOpener::new();
//! let mut channel = opener.open().unwrap();
//!
//! channel.responses.push_back(b"0#".to_vec());
//! channel.write(b"L").unwrap();
//! assert_eq!(channel.read(2).unwrap(), b"0#");
//! assert_eq!(channel.writes, vec![b"L".to_vec()]);
//! ```
//!
//! [`MockOpener`]: crate::hal::MockOpener
//! [`SimulatedMount`]: crate::hal::SimulatedMount

use crate::error::ChannelError;

/// An open, exclusively owned byte link to the mount.
///
/// # Implementation Notes
///
/// - `read` returns at most `max_bytes` bytes and may stop early once the
///   `#` terminator arrives
/// - A read that times out before the terminator must return
///   [`ChannelError::Timeout`], not an empty or partial buffer
/// - `read_exact` must not stop at `#`; binary replies may contain it
/// - `close` should be idempotent; the controller may call it from `Drop`
///   after an explicit disconnect
pub trait MountChannel {
    /// Write a complete request frame.
    fn write(&mut self, bytes: &[u8]) -> Result<(), ChannelError>;

    /// Read up to `max_bytes`, blocking until the terminator, the limit, or
    /// the timeout.
    fn read(&mut self, max_bytes: usize) -> Result<Vec<u8>, ChannelError>;

    /// Read exactly `len` bytes, ignoring terminator bytes along the way.
    ///
    /// The default repeats [`read`](Self::read) until `len` bytes have
    /// arrived. A timeout part way through is still [`ChannelError::Timeout`].
    fn read_exact(&mut self, len: usize) -> Result<Vec<u8>, ChannelError> {
        let mut reply = Vec::with_capacity(len);
        while reply.len() < len {
            let chunk = self.read(len - reply.len())?;
            if chunk.is_empty() {
                return Err(ChannelError::Timeout);
            }
            reply.extend_from_slice(&chunk);
        }
        Ok(reply)
    }

    /// Discard any input already received but not yet read.
    ///
    /// Called after a timeout so a late reply cannot be mistaken for the
    /// answer to the next request.
    fn clear_input(&mut self) -> Result<(), ChannelError>;

    /// Release the underlying device.
    fn close(&mut self) -> Result<(), ChannelError> {
        Ok(())
    }
}

/// Opens channels to the mount.
///
/// The controller holds an opener rather than a channel so it can reopen
/// the link after the device goes away.
///
/// # Example Implementation
///
/// ```rust,ignore
/// struct TcpOpener { addr: SocketAddr }
///
/// impl ChannelOpener for TcpOpener {
///     type Channel = TcpChannel;
///
///     fn open(&mut self) -> Result<TcpChannel, ChannelError> {
///         TcpStream::connect(self.addr)
///             .map(TcpChannel::new)
///             .map_err(|e| ChannelError::OpenFailed(e.to_string()))
///     }
/// }
/// ```
pub trait ChannelOpener {
    /// Channel type produced by this opener.
    type Channel: MountChannel;

    /// Open a fresh channel.
    fn open(&mut self) -> Result<Self::Channel, ChannelError>;

    /// Human-readable name of the device, for logs.
    fn describe(&self) -> String {
        String::from("mount")
    }
}
