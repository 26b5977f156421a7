//! Mount controller that ties the codec, state, and channel together.
//!
//! This module provides [`MountController`], the central component that
//! owns the channel and the client-side [`MountState`], and runs each
//! operation as one request/response exchange.
//!
//! # Overview
//!
//! The mount controller:
//! - Opens the channel at construction and reopens it on [`reconnect`]
//! - Picks coarse or precise command variants from the precision mode
//! - Remembers the last tracking mode the mount acknowledged
//! - Applies the mirror altitude correction after RA/Dec gotos
//! - Flushes stale input after a timed-out or undecodable exchange
//!
//! # Example
//!
//! ```rust
//! use synscan_mount::{MountController, Equatorial, TrackingMode, hal::SimulatedMount};
//!
//! let mut mount = MountController::new(SimulatedMount::new());
//! assert!(mount.is_connected());
//!
//! mount.goto_ra_dec(Equatorial::new(83.8, -5.4)).unwrap();
//! mount.set_tracking(TrackingMode::Equatorial).unwrap();
//! assert!(mount.state().is_tracking());
//!
//! let here = mount.ra_dec().unwrap();
//! assert!((here.ra - 83.8).abs() < 0.01);
//! ```
//!
//! # Mirror Pointing
//!
//! With [`PointingMode::Mirror`], an RA/Dec goto is followed by a second,
//! precise Azm/Alt goto that halves the zenith distance, so a flat mirror
//! at the eyepiece reflects the target:
//!
//! ```rust
//! use synscan_mount::{MountController, PointingMode, Equatorial, Horizontal, hal::SimulatedMount};
//!
//! let sim = SimulatedMount::new().with_azm_alt(Horizontal::new(100.0, 60.0));
//! let mut mount = MountController::new(sim);
//! mount.set_pointing_mode(PointingMode::Mirror);
//!
//! let applied = mount.goto_ra_dec(Equatorial::new(0.0, 0.0)).unwrap();
//! assert!(applied.is_some());
//! ```
//!
//! [`reconnect`]: MountController::reconnect

use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::codec::{
    decode_ack, decode_echo, decode_flag, decode_model, decode_pier_side, decode_position,
    decode_slewing, decode_version, Command, FirmwareVersion, PierSide,
};
use crate::config::{MirrorSettle, MountConfig};
use crate::coords::{parse_azm_alt, parse_pretty_equatorial, signed_degrees};
use crate::coords::{Equatorial, Horizontal};
use crate::error::{ChannelError, MountError, Result};
use crate::state::{MountState, PointingMode, PrecisionMode, TrackingMode};
use crate::traits::{ChannelOpener, MountChannel};

/// Altitude to command so a mirror reflects a target seen at `alt`.
///
/// Takes the signed altitude in degrees and returns `90 - (90 - alt) / 2`.
pub fn mirror_altitude(alt: f64) -> f64 {
    90.0 - (90.0 - alt) / 2.0
}

/// Main mount controller.
///
/// Owns the channel and all client-side state. Every operation is a single
/// blocking exchange, so the controller takes `&mut self` throughout.
///
/// # Type Parameter
///
/// - `O`: The channel opener ([`ChannelOpener`] trait)
///
/// # Thread Safety
///
/// The controller itself is not thread-safe. To share one mount between
/// threads, wrap it in `Arc<Mutex<MountController<_>>>`; the protocol is
/// half-duplex and exchanges must not interleave.
pub struct MountController<O: ChannelOpener> {
    opener: O,
    channel: Option<O::Channel>,
    state: MountState,
    settle: MirrorSettle,
    needs_flush: bool,
}

impl<O: ChannelOpener> MountController<O> {
    /// Create a controller with default settings and try to connect.
    ///
    /// An open failure is logged and leaves the controller disconnected;
    /// call [`reconnect`](Self::reconnect) to retry.
    pub fn new(opener: O) -> Self {
        Self::with_config(opener, &MountConfig::default())
    }

    /// Create a controller with the given settings and try to connect.
    pub fn with_config(opener: O, config: &MountConfig) -> Self {
        let mut controller = Self {
            opener,
            channel: None,
            state: MountState {
                connected: false,
                precision: config.precision,
                tracking: None,
                pointing: config.pointing,
            },
            settle: config.settle,
            needs_flush: false,
        };
        controller.reconnect().ok();
        controller
    }

    // ========================================================================
    // Connection
    // ========================================================================

    /// Open the channel if it is not already open.
    ///
    /// A no-op when connected. On failure the controller stays disconnected
    /// and returns [`MountError::Disconnected`].
    pub fn reconnect(&mut self) -> Result<()> {
        if self.channel.is_some() {
            return Ok(());
        }

        match self.opener.open() {
            Ok(channel) => {
                info!("Connected to {}", self.opener.describe());
                self.channel = Some(channel);
                self.state.connected = true;
                self.needs_flush = false;
                Ok(())
            }
            Err(e) => {
                warn!("Could not connect to {}: {e}", self.opener.describe());
                self.state.connected = false;
                Err(MountError::Disconnected)
            }
        }
    }

    /// Close the channel. Safe to call when already disconnected.
    pub fn disconnect(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            if let Err(e) = channel.close() {
                warn!("Error closing {}: {e}", self.opener.describe());
            }
            info!("Disconnected from {}", self.opener.describe());
        }
        self.state.connected = false;
    }

    /// Returns true while a channel is open.
    pub fn is_connected(&self) -> bool {
        self.state.connected
    }

    /// Snapshot of the client-side state.
    pub fn state(&self) -> MountState {
        self.state
    }

    /// The open channel, if any.
    pub fn channel(&self) -> Option<&O::Channel> {
        self.channel.as_ref()
    }

    /// Mutable access to the open channel, if any.
    pub fn channel_mut(&mut self) -> Option<&mut O::Channel> {
        self.channel.as_mut()
    }

    /// The opener used for (re)connecting.
    pub fn opener(&self) -> &O {
        &self.opener
    }

    /// Mutable access to the opener, e.g. to change the port before reconnecting.
    pub fn opener_mut(&mut self) -> &mut O {
        &mut self.opener
    }

    // ========================================================================
    // Modes
    // ========================================================================

    /// Flip between coarse and precise encoding.
    ///
    /// Only allowed while connected; returns the new mode.
    pub fn toggle_precision(&mut self) -> Result<PrecisionMode> {
        if !self.state.connected {
            return Err(MountError::Disconnected);
        }
        self.state.precision = self.state.precision.toggled();
        info!("Precision set to {:?}", self.state.precision);
        Ok(self.state.precision)
    }

    /// Set the encoding used for gotos, syncs, and queries.
    pub fn set_precision(&mut self, precision: PrecisionMode) {
        self.state.precision = precision;
    }

    /// Set the optical pointing configuration.
    pub fn set_pointing_mode(&mut self, pointing: PointingMode) {
        self.state.pointing = pointing;
    }

    /// Set the wait policy before the mirror correction pass.
    pub fn set_mirror_settle(&mut self, settle: MirrorSettle) {
        self.settle = settle;
    }

    // ========================================================================
    // Exchange
    // ========================================================================

    /// Send one command, read its reply, and decode it.
    ///
    /// A write failure returns before any read. A read timeout or a reply
    /// that fails to decode marks the input as stale so it is cleared before
    /// the next request.
    fn exchange<T>(
        &mut self,
        command: Command,
        decode: impl FnOnce(&[u8]) -> Result<T>,
    ) -> Result<T> {
        let reply = self.transfer(command)?;
        decode(&reply).map_err(|e| {
            warn!(?command, "Bad reply: {e}");
            self.needs_flush = true;
            e
        })
    }

    fn transfer(&mut self, command: Command) -> Result<Vec<u8>> {
        let channel = self.channel.as_mut().ok_or(MountError::Disconnected)?;

        if self.needs_flush {
            debug!("Clearing stale input");
            channel.clear_input()?;
            self.needs_flush = false;
        }

        let frame = command.encode();
        debug!(?command, "-> {:?}", String::from_utf8_lossy(&frame));

        if let Err(e) = channel.write(&frame) {
            warn!(?command, "Write failed: {e}");
            return Err(e.into());
        }

        let len = command.response_len();
        let read = if command.binary_reply() {
            channel.read_exact(len)
        } else {
            channel.read(len)
        };

        match read {
            Ok(reply) => {
                debug!(?command, "<- {:?}", String::from_utf8_lossy(&reply));
                Ok(reply)
            }
            Err(ChannelError::Timeout) => {
                warn!(?command, "No reply before timeout");
                self.needs_flush = true;
                Err(MountError::ReadTimeout)
            }
            Err(e) => {
                warn!(?command, "Read failed: {e}");
                self.needs_flush = true;
                Err(e.into())
            }
        }
    }

    /// Exchange a command whose reply is a bare acknowledgement.
    fn command(&mut self, command: Command) -> Result<()> {
        self.exchange(command, decode_ack)
    }

    // ========================================================================
    // Position
    // ========================================================================

    /// Current RA/Dec at the configured precision.
    pub fn ra_dec(&mut self) -> Result<Equatorial> {
        self.ra_dec_with(self.state.precision)
    }

    /// Current RA/Dec at an explicit precision.
    pub fn ra_dec_with(&mut self, precision: PrecisionMode) -> Result<Equatorial> {
        let (ra, dec) = self.exchange(Command::GetRaDec(precision), |reply| {
            decode_position(reply, precision)
        })?;
        Ok(Equatorial::new(ra, dec))
    }

    /// Current Azm/Alt at the configured precision.
    pub fn azm_alt(&mut self) -> Result<Horizontal> {
        self.azm_alt_with(self.state.precision)
    }

    /// Current Azm/Alt at an explicit precision.
    pub fn azm_alt_with(&mut self, precision: PrecisionMode) -> Result<Horizontal> {
        let (azm, alt) = self.exchange(Command::GetAzmAlt(precision), |reply| {
            decode_position(reply, precision)
        })?;
        Ok(Horizontal::new(azm, alt))
    }

    // ========================================================================
    // Goto / Sync
    // ========================================================================

    /// Slew to an RA/Dec target.
    ///
    /// In mirror mode this is followed by the altitude correction pass, and
    /// the corrected Azm/Alt target is returned. In telescope mode returns
    /// `Ok(None)`.
    ///
    /// If the primary goto succeeds but the correction fails, the error is
    /// returned and the mount is left at the uncorrected target.
    pub fn goto_ra_dec(&mut self, target: Equatorial) -> Result<Option<Horizontal>> {
        let precision = self.state.precision;
        self.command(Command::GotoRaDec(precision, target))?;
        info!("Goto RA {:.4} Dec {:.4}", target.ra, target.dec);

        match self.state.pointing {
            PointingMode::Telescope => Ok(None),
            PointingMode::Mirror => self.compensate_for_mirror().map(Some),
        }
    }

    fn compensate_for_mirror(&mut self) -> Result<Horizontal> {
        self.wait_for_settle()?;

        let current = self.azm_alt_with(PrecisionMode::Precise)?;
        let corrected = Horizontal::new(current.azm, mirror_altitude(signed_degrees(current.alt)));
        self.command(Command::GotoAzmAlt(PrecisionMode::Precise, corrected))?;

        info!(
            "Mirror correction: alt {:.4} -> {:.4} at azm {:.4}",
            current.alt, corrected.alt, corrected.azm
        );
        Ok(corrected)
    }

    fn wait_for_settle(&mut self) -> Result<()> {
        let MirrorSettle::PollUntilIdle {
            interval_ms,
            max_polls,
        } = self.settle
        else {
            return Ok(());
        };

        for _ in 0..max_polls {
            if !self.is_slewing()? {
                return Ok(());
            }
            if interval_ms > 0 {
                thread::sleep(Duration::from_millis(u64::from(interval_ms)));
            }
        }

        warn!("Mount still slewing after {max_polls} polls; skipping mirror correction");
        Err(MountError::ReadTimeout)
    }

    /// Slew to an Azm/Alt target. No mirror correction is applied.
    pub fn goto_azm_alt(&mut self, target: Horizontal) -> Result<()> {
        let precision = self.state.precision;
        self.command(Command::GotoAzmAlt(precision, target))?;
        info!("Goto Azm {:.4} Alt {:.4}", target.azm, target.alt);
        Ok(())
    }

    /// Tell the mount it is currently pointing at `target`.
    pub fn sync_ra_dec(&mut self, target: Equatorial) -> Result<()> {
        let precision = self.state.precision;
        self.command(Command::SyncRaDec(precision, target))?;
        info!("Synced to RA {:.4} Dec {:.4}", target.ra, target.dec);
        Ok(())
    }

    /// [`goto_ra_dec`](Self::goto_ra_dec) from `"hh mm ss.s+dd mm ss.s"` text.
    pub fn goto_ra_dec_text(&mut self, text: &str) -> Result<Option<Horizontal>> {
        let target = parse_pretty_equatorial(text)?;
        self.goto_ra_dec(target)
    }

    /// [`goto_azm_alt`](Self::goto_azm_alt) from `"azm,alt"` text.
    pub fn goto_azm_alt_text(&mut self, text: &str) -> Result<()> {
        let target = parse_azm_alt(text)?;
        self.goto_azm_alt(target)
    }

    /// [`sync_ra_dec`](Self::sync_ra_dec) from `"hh mm ss.s+dd mm ss.s"` text.
    pub fn sync_ra_dec_text(&mut self, text: &str) -> Result<()> {
        let target = parse_pretty_equatorial(text)?;
        self.sync_ra_dec(target)
    }

    // ========================================================================
    // Motion
    // ========================================================================

    /// Returns true while a goto is in progress.
    pub fn is_slewing(&mut self) -> Result<bool> {
        self.exchange(Command::IsSlewing, decode_slewing)
    }

    /// Abort a goto in progress. Tracking is recorded as off on success.
    pub fn cancel_goto(&mut self) -> Result<()> {
        self.command(Command::CancelGoto)?;
        self.state.tracking = Some(TrackingMode::Off);
        info!("Goto cancelled");
        Ok(())
    }

    /// Set tracking from a raw protocol value.
    ///
    /// Values above 3 are rejected with [`MountError::ArgumentError`] and
    /// nothing is sent.
    pub fn set_tracking_mode(&mut self, raw: u8) -> Result<()> {
        let mode = TrackingMode::try_from(raw)?;
        self.set_tracking(mode)
    }

    /// Set the tracking mode. State only changes once the mount acknowledges.
    pub fn set_tracking(&mut self, mode: TrackingMode) -> Result<()> {
        self.command(Command::SetTracking(mode))?;
        self.state.tracking = Some(mode);
        info!("Tracking set to {}", mode.as_str());
        Ok(())
    }

    /// Cancel any goto in progress, then turn tracking off.
    pub fn stop(&mut self) -> Result<()> {
        if self.is_slewing()? {
            self.cancel_goto()?;
        }
        self.set_tracking(TrackingMode::Off)
    }

    // ========================================================================
    // Information
    // ========================================================================

    /// Hand controller firmware version.
    pub fn version(&mut self) -> Result<FirmwareVersion> {
        self.exchange(Command::GetVersion, decode_version)
    }

    /// Raw mount model identifier.
    pub fn model(&mut self) -> Result<u8> {
        self.exchange(Command::GetModel, decode_model)
    }

    /// Round-trip `byte` through the hand controller to check the link.
    pub fn echo(&mut self, byte: u8) -> Result<()> {
        self.exchange(Command::Echo(byte), |reply| decode_echo(reply, byte))
    }

    /// Whether alignment has been completed on the hand controller.
    pub fn is_alignment_complete(&mut self) -> Result<bool> {
        self.exchange(Command::IsAlignmentComplete, decode_flag)
    }

    /// Side of the pier the tube is on.
    pub fn pier_side(&mut self) -> Result<PierSide> {
        self.exchange(Command::GetPierSide, decode_pier_side)
    }
}

impl<O: ChannelOpener> Drop for MountController<O> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockOpener, SimulatedMount};

    fn mock_with(responses: &[&[u8]]) -> MountController<MockOpener> {
        let opener = MockOpener::new().with_responses(responses.iter().map(|r| r.to_vec()));
        MountController::new(opener)
    }

    fn writes(mount: &MountController<MockOpener>) -> Vec<Vec<u8>> {
        mount.channel().map(|c| c.writes.clone()).unwrap_or_default()
    }

    // =========================================================================
    // Construction and connection
    // =========================================================================

    #[test]
    fn new_connects() {
        let mount = MountController::new(MockOpener::new());
        assert!(mount.is_connected());
        assert_eq!(mount.opener().open_count, 1);
        assert_eq!(mount.state().tracking, None);
    }

    #[test]
    fn new_with_unavailable_device_stays_disconnected() {
        let mut mount = MountController::new(MockOpener::unavailable());
        assert!(!mount.is_connected());
        assert!(mount.channel().is_none());
        assert_eq!(mount.ra_dec(), Err(MountError::Disconnected));
        assert_eq!(mount.reconnect(), Err(MountError::Disconnected));
    }

    #[test]
    fn with_config_applies_modes() {
        let config = MountConfig::default()
            .with_precision(PrecisionMode::Precise)
            .with_pointing(PointingMode::Mirror);
        let mount = MountController::with_config(MockOpener::new(), &config);
        assert_eq!(mount.state().precision, PrecisionMode::Precise);
        assert_eq!(mount.state().pointing, PointingMode::Mirror);
    }

    #[test]
    fn reconnect_is_noop_when_connected() {
        let mut mount = MountController::new(MockOpener::new());
        mount.reconnect().unwrap();
        mount.reconnect().unwrap();
        assert_eq!(mount.opener().open_count, 1);
    }

    #[test]
    fn disconnect_closes_channel() {
        let mut mount = MountController::new(MockOpener::new());
        mount.disconnect();
        assert!(!mount.is_connected());
        assert_eq!(mount.opener().closed_count(), 1);

        mount.disconnect();
        assert_eq!(mount.opener().closed_count(), 1);

        mount.reconnect().unwrap();
        assert!(mount.is_connected());
        assert_eq!(mount.opener().open_count, 2);
    }

    // =========================================================================
    // Precision dispatch
    // =========================================================================

    #[test]
    fn coarse_and_precise_goto_frames() {
        let mut mount = mock_with(&[b"#", b"#"]);
        let target = Equatorial::new(180.0, 90.0);

        mount.goto_ra_dec(target).unwrap();
        mount.set_precision(PrecisionMode::Precise);
        mount.goto_ra_dec(target).unwrap();

        assert_eq!(
            writes(&mount),
            vec![b"R8000,4000".to_vec(), b"r80000000,40000000".to_vec()]
        );
    }

    #[test]
    fn position_queries_follow_precision() {
        let mut mount = mock_with(&[b"4000,2000#", b"40000000,20000000#"]);
        assert_eq!(mount.azm_alt().unwrap(), Horizontal::new(90.0, 45.0));
        assert_eq!(
            mount.ra_dec_with(PrecisionMode::Precise).unwrap(),
            Equatorial::new(90.0, 45.0)
        );
        assert_eq!(writes(&mount), vec![b"Z".to_vec(), b"e".to_vec()]);
    }

    #[test]
    fn toggle_precision_requires_connection() {
        let mut mount = MountController::new(MockOpener::new());
        assert_eq!(mount.toggle_precision(), Ok(PrecisionMode::Precise));
        assert_eq!(mount.toggle_precision(), Ok(PrecisionMode::Coarse));

        mount.disconnect();
        assert_eq!(mount.toggle_precision(), Err(MountError::Disconnected));
        assert_eq!(mount.state().precision, PrecisionMode::Coarse);
    }

    // =========================================================================
    // Tracking
    // =========================================================================

    #[test]
    fn set_tracking_out_of_range_writes_nothing() {
        let mut mount = mock_with(&[]);
        assert!(matches!(
            mount.set_tracking_mode(4),
            Err(MountError::ArgumentError(_))
        ));
        assert!(writes(&mount).is_empty());
        assert_eq!(mount.state().tracking, None);
    }

    #[test]
    fn set_tracking_updates_state_on_ack() {
        let mut mount = mock_with(&[b"#"]);
        mount.set_tracking_mode(2).unwrap();
        assert_eq!(writes(&mount), vec![vec![b'T', 2]]);
        assert_eq!(mount.state().tracking, Some(TrackingMode::Equatorial));
        assert!(mount.state().is_tracking());
    }

    #[test]
    fn set_tracking_timeout_keeps_state() {
        let mut mount = mock_with(&[b"#"]);
        mount.set_tracking(TrackingMode::AltAz).unwrap();
        assert_eq!(mount.set_tracking(TrackingMode::Off), Err(MountError::ReadTimeout));
        assert_eq!(mount.state().tracking, Some(TrackingMode::AltAz));
    }

    #[test]
    fn set_tracking_bad_ack_keeps_state() {
        let mut mount = mock_with(&[b"x"]);
        assert!(matches!(
            mount.set_tracking(TrackingMode::Pec),
            Err(MountError::ProtocolMismatch(_))
        ));
        assert_eq!(mount.state().tracking, None);
    }

    #[test]
    fn cancel_goto_forces_tracking_off() {
        let mut mount = mock_with(&[b"#", b"#"]);
        mount.set_tracking(TrackingMode::Equatorial).unwrap();
        mount.cancel_goto().unwrap();
        assert!(mount.state().is_stopped());
        assert_eq!(writes(&mount).last().unwrap(), b"M");
    }

    #[test]
    fn stop_skips_cancel_when_idle() {
        let mut mount = mock_with(&[b"0#", b"#"]);
        mount.stop().unwrap();
        assert_eq!(writes(&mount), vec![b"L".to_vec(), vec![b'T', 0]]);
        assert!(mount.state().is_stopped());
    }

    #[test]
    fn stop_cancels_running_goto() {
        let mut mount = mock_with(&[b"1#", b"#", b"#"]);
        mount.stop().unwrap();
        assert_eq!(
            writes(&mount),
            vec![b"L".to_vec(), b"M".to_vec(), vec![b'T', 0]]
        );
    }

    // =========================================================================
    // Failure handling
    // =========================================================================

    #[test]
    fn failing_writes_fail_every_operation() {
        let mut mount = MountController::new(MockOpener::new().with_failing_writes());
        assert!(matches!(mount.ra_dec(), Err(MountError::WriteFailure(_))));
        assert!(matches!(
            mount.set_tracking(TrackingMode::AltAz),
            Err(MountError::WriteFailure(_))
        ));
        assert!(matches!(mount.cancel_goto(), Err(MountError::WriteFailure(_))));
        assert_eq!(mount.state().tracking, None);
        assert!(mount.is_connected());
    }

    #[test]
    fn timeout_flushes_before_next_command() {
        let mut mount = mock_with(&[]);
        assert_eq!(mount.is_slewing(), Err(MountError::ReadTimeout));
        assert_eq!(mount.channel().unwrap().clear_count, 0);

        mount.channel_mut().unwrap().push_response(b"0#");
        assert_eq!(mount.is_slewing(), Ok(false));
        assert_eq!(mount.channel().unwrap().clear_count, 1);

        mount.channel_mut().unwrap().push_response(b"0#");
        mount.is_slewing().unwrap();
        assert_eq!(mount.channel().unwrap().clear_count, 1);
    }

    #[test]
    fn bad_reply_flushes_before_next_command() {
        // "1x" is read, the trailing "#" is left behind
        let mut mount = mock_with(&[b"1x#", b"0#"]);
        assert!(matches!(
            mount.is_slewing(),
            Err(MountError::ProtocolMismatch(_))
        ));
        assert_eq!(mount.channel().unwrap().pending, b"#");

        assert_eq!(mount.is_slewing(), Ok(false));
        assert_eq!(mount.channel().unwrap().clear_count, 1);
    }

    #[test]
    fn binary_reply_containing_terminator() {
        let mut mount = mock_with(&[&[4, b'#'], b"#"]);
        let version = mount.version().unwrap();
        assert_eq!((version.major, version.minor), (4, 35));
        assert_eq!(mount.channel().unwrap().clear_count, 0);
    }

    #[test]
    fn text_errors_write_nothing() {
        let mut mount = mock_with(&[]);
        assert!(matches!(
            mount.goto_ra_dec_text("not coordinates"),
            Err(MountError::InvalidCoordinates(_))
        ));
        assert!(matches!(
            mount.goto_azm_alt_text("100"),
            Err(MountError::InvalidCoordinates(_))
        ));
        assert!(writes(&mount).is_empty());
    }

    // =========================================================================
    // Mirror correction
    // =========================================================================

    #[test]
    fn mirror_altitude_formula() {
        assert_eq!(mirror_altitude(60.0), 75.0);
        assert_eq!(mirror_altitude(90.0), 90.0);
        assert_eq!(mirror_altitude(0.0), 45.0);
        assert_eq!(mirror_altitude(-10.0), 40.0);
    }

    #[test]
    fn mirror_goto_sends_corrected_azm_alt() {
        let mut mount = mock_with(&[b"#", b"471C7100,2AAAAA00#", b"#"]);
        mount.set_pointing_mode(PointingMode::Mirror);

        let corrected = mount.goto_ra_dec(Equatorial::new(10.0, 20.0)).unwrap().unwrap();
        assert!((corrected.azm - 100.0).abs() < 1e-3);
        assert!((corrected.alt - 75.0).abs() < 1e-3);

        let sent = writes(&mount);
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[1], b"z");
        assert_eq!(sent[2], b"b471C7100,35555500");
    }

    #[test]
    fn telescope_goto_has_no_correction() {
        let mut mount = mock_with(&[b"#"]);
        assert_eq!(mount.goto_ra_dec(Equatorial::new(10.0, 20.0)), Ok(None));
        assert_eq!(writes(&mount).len(), 1);
    }

    #[test]
    fn sync_never_corrects() {
        let mut mount = mock_with(&[b"#"]);
        mount.set_pointing_mode(PointingMode::Mirror);
        mount.sync_ra_dec(Equatorial::new(270.0, 0.0)).unwrap();
        assert_eq!(writes(&mount), vec![b"SC000,0000".to_vec()]);
    }

    #[test]
    fn mirror_settle_polls_until_idle() {
        let sim = SimulatedMount::new()
            .with_azm_alt(Horizontal::new(100.0, 60.0))
            .with_slew_polls(3);
        let config = MountConfig::default()
            .with_pointing(PointingMode::Mirror)
            .with_settle(MirrorSettle::poll(0, 10));
        let mut mount = MountController::with_config(sim, &config);

        mount.goto_ra_dec(Equatorial::new(50.0, 10.0)).unwrap();
        let polls = mount
            .channel()
            .unwrap()
            .received
            .iter()
            .filter(|f| f.as_slice() == b"L")
            .count();
        assert_eq!(polls, 4);
    }

    #[test]
    fn mirror_settle_gives_up() {
        let sim = SimulatedMount::new().with_slew_polls(100);
        let config = MountConfig::default()
            .with_pointing(PointingMode::Mirror)
            .with_settle(MirrorSettle::poll(0, 5));
        let mut mount = MountController::with_config(sim, &config);

        assert_eq!(
            mount.goto_ra_dec(Equatorial::new(50.0, 10.0)),
            Err(MountError::ReadTimeout)
        );
        let received = &mount.channel().unwrap().received;
        assert!(!received.iter().any(|f| f.first() == Some(&b'b')));
    }

    // =========================================================================
    // Information
    // =========================================================================

    #[test]
    fn info_queries() {
        let mut mount = MountController::new(SimulatedMount::new());
        assert_eq!(mount.version().unwrap().to_string(), "4.39");
        assert_eq!(mount.model(), Ok(1));
        assert!(mount.echo(b'k').is_ok());
        assert_eq!(mount.is_alignment_complete(), Ok(true));
        assert_eq!(mount.pier_side(), Ok(PierSide::East));
    }

    #[test]
    fn drop_closes_channel() {
        let opener = MockOpener::new();
        let probe = opener.clone();
        let mount = MountController::new(opener);
        assert_eq!(probe.closed_count(), 0);

        drop(mount);
        assert_eq!(probe.closed_count(), 1);
    }
}
