//! Error types for the mount protocol engine.
//!
//! Two layers of errors exist:
//!
//! | Type | Raised by | Meaning |
//! |------|-----------|---------|
//! | [`ChannelError`] | [`MountChannel`] / [`ChannelOpener`] | The byte transport failed |
//! | [`MountError`] | [`MountController`] | A protocol operation failed |
//!
//! Channel errors are folded into mount errors at the controller boundary:
//! write failures become [`MountError::WriteFailure`], timeouts become
//! [`MountError::ReadTimeout`], and any other read failure is reported as a
//! [`MountError::ProtocolMismatch`] since the exchange can no longer be
//! trusted.
//!
//! None of these are fatal. A failed operation leaves the controller usable;
//! callers are expected to surface the failure as a status indicator.
//!
//! [`MountChannel`]: crate::traits::MountChannel
//! [`ChannelOpener`]: crate::traits::ChannelOpener
//! [`MountController`]: crate::MountController

/// Failure reported by a byte channel.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// The channel could not be opened (port missing, busy, no permission).
    #[error("failed to open channel: {0}")]
    OpenFailed(String),

    /// Bytes could not be written.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// Reading failed for a reason other than a timeout.
    #[error("read failed: {0}")]
    ReadFailed(String),

    /// No complete response arrived before the configured timeout.
    #[error("read timed out")]
    Timeout,
}

/// Failure of a mount protocol operation.
///
/// # Example
///
/// ```rust
/// use synscan_mount::{MountController, MountError, hal::MockOpener};
///
/// let mut mount = MountController::new(MockOpener::new());
///
/// // Out-of-range tracking modes never reach the wire
/// assert!(matches!(mount.set_tracking_mode(4), Err(MountError::ArgumentError(_))));
/// assert!(mount.channel().unwrap().writes.is_empty());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MountError {
    /// No channel is open.
    #[error("no device connected")]
    Disconnected,

    /// The request frame could not be written.
    #[error("communication failure: {0}")]
    WriteFailure(String),

    /// The mount did not answer within the channel timeout.
    #[error("mount did not respond before timeout")]
    ReadTimeout,

    /// The response was short, unterminated, or not parseable.
    #[error("unexpected response: {0}")]
    ProtocolMismatch(String),

    /// A caller-supplied argument is outside the accepted range.
    #[error("invalid argument: {0}")]
    ArgumentError(String),

    /// Free-text coordinate input could not be parsed.
    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(String),
}

impl MountError {
    /// Returns true if the error means the link is gone or out of step.
    ///
    /// After such an error the caller may want to [`reconnect`] rather than
    /// keep issuing commands.
    ///
    /// [`reconnect`]: crate::MountController::reconnect
    pub fn is_link_error(&self) -> bool {
        matches!(
            self,
            MountError::Disconnected | MountError::WriteFailure(_) | MountError::ReadTimeout
        )
    }
}

impl From<ChannelError> for MountError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::OpenFailed(_) => MountError::Disconnected,
            ChannelError::WriteFailed(msg) => MountError::WriteFailure(msg),
            ChannelError::Timeout => MountError::ReadTimeout,
            ChannelError::ReadFailed(msg) => MountError::ProtocolMismatch(msg),
        }
    }
}

/// Result alias for mount operations.
pub type Result<T> = std::result::Result<T, MountError>;
