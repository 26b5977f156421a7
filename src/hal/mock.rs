//! Mock channels for testing without a mount attached.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockChannel`] | [`MountChannel`] | Records writes, replays queued replies |
//! | [`MockOpener`] | [`ChannelOpener`] | Hands out `MockChannel`s, can refuse to open |
//! | [`SimulatedMount`] | both | Answers the command set like a hand controller |
//!
//! `MockChannel` is scripted: each `read` pops the next queued reply, and an
//! empty queue reads as a timeout. `SimulatedMount` keeps a little state
//! (positions, tracking, a slew countdown) and generates replies from the
//! requests it receives.
//!
//! # Example
//!
//! ```rust
//! use synscan_mount::{MountController, Equatorial};
//! use synscan_mount::hal::MockOpener;
//!
//! let opener = MockOpener::new().with_responses([b"#".to_vec()]);
//! let mut mount = MountController::new(opener);
//!
//! mount.goto_ra_dec(Equatorial::new(180.0, 90.0)).unwrap();
//! assert_eq!(mount.channel().unwrap().writes, vec![b"R8000,4000".to_vec()]);
//! ```
//!
//! [`MountChannel`]: crate::traits::MountChannel
//! [`ChannelOpener`]: crate::traits::ChannelOpener

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::codec::{decode_position, encode_pair, FirmwareVersion, PierSide, TERMINATOR};
use crate::coords::{Equatorial, Horizontal};
use crate::error::ChannelError;
use crate::state::{PrecisionMode, TrackingMode};
use crate::traits::{ChannelOpener, MountChannel};

// ============================================================================
// Scripted channel
// ============================================================================

/// Scripted in-memory channel.
///
/// Public fields may be inspected and modified directly in tests.
#[derive(Debug, Default)]
pub struct MockChannel {
    /// Every frame written, in order.
    pub writes: Vec<Vec<u8>>,
    /// Replies returned by successive reads. Empty means timeout.
    pub responses: VecDeque<Vec<u8>>,
    /// Bytes left over from a reply longer than the requested read.
    pub pending: Vec<u8>,
    /// When set, every write fails.
    pub fail_writes: bool,
    /// Number of `clear_input` calls.
    pub clear_count: usize,
    closed: bool,
    close_counter: Rc<Cell<usize>>,
}

impl MockChannel {
    /// Creates an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for a future read.
    pub fn push_response(&mut self, reply: &[u8]) {
        self.responses.push_back(reply.to_vec());
    }

    /// Returns true once `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl MountChannel for MockChannel {
    fn write(&mut self, bytes: &[u8]) -> Result<(), ChannelError> {
        if self.fail_writes {
            return Err(ChannelError::WriteFailed("mock write failure".into()));
        }
        self.writes.push(bytes.to_vec());
        Ok(())
    }

    fn read(&mut self, max_bytes: usize) -> Result<Vec<u8>, ChannelError> {
        let mut reply = if self.pending.is_empty() {
            self.responses.pop_front().ok_or(ChannelError::Timeout)?
        } else {
            core::mem::take(&mut self.pending)
        };

        if reply.len() > max_bytes {
            self.pending = reply.split_off(max_bytes);
        }
        Ok(reply)
    }

    fn clear_input(&mut self) -> Result<(), ChannelError> {
        self.pending.clear();
        self.clear_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), ChannelError> {
        if !self.closed {
            self.closed = true;
            self.close_counter.set(self.close_counter.get() + 1);
        }
        Ok(())
    }
}

/// Opener that hands out [`MockChannel`]s.
///
/// Replies queued on the opener move into the next channel it opens.
/// Clones share the close counter, so a clone kept by a test still sees
/// closes after the original has been moved into a controller.
///
/// # Example
///
/// ```rust
/// use synscan_mount::hal::MockOpener;
/// use synscan_mount::traits::{ChannelOpener, MountChannel};
///
/// let mut opener = MockOpener::new();
/// let mut channel = opener.open().unwrap();
/// assert_eq!(opener.open_count, 1);
///
/// channel.close().unwrap();
/// channel.close().unwrap();
/// assert_eq!(opener.closed_count(), 1);
///
/// opener.fail_open = true;
/// assert!(opener.open().is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct MockOpener {
    /// Replies moved into the next opened channel.
    pub responses: VecDeque<Vec<u8>>,
    /// When set, opened channels fail every write.
    pub fail_writes: bool,
    /// When set, `open` fails.
    pub fail_open: bool,
    /// Number of successful opens.
    pub open_count: usize,
    close_counter: Rc<Cell<usize>>,
}

impl MockOpener {
    /// Creates an opener that succeeds and yields empty channels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an opener whose every open attempt fails.
    pub fn unavailable() -> Self {
        Self {
            fail_open: true,
            ..Self::default()
        }
    }

    /// Queue replies for the next opened channel.
    pub fn with_responses<I>(mut self, responses: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        self.responses.extend(responses);
        self
    }

    /// Make opened channels fail every write.
    pub fn with_failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Number of channels from this opener that have been closed.
    pub fn closed_count(&self) -> usize {
        self.close_counter.get()
    }
}

impl ChannelOpener for MockOpener {
    type Channel = MockChannel;

    fn open(&mut self) -> Result<MockChannel, ChannelError> {
        if self.fail_open {
            return Err(ChannelError::OpenFailed("mock device unavailable".into()));
        }
        self.open_count += 1;
        Ok(MockChannel {
            responses: core::mem::take(&mut self.responses),
            fail_writes: self.fail_writes,
            close_counter: Rc::clone(&self.close_counter),
            ..MockChannel::default()
        })
    }

    fn describe(&self) -> String {
        String::from("mock")
    }
}

// ============================================================================
// Simulated hand controller
// ============================================================================

/// Stateful stand-in for a hand controller.
///
/// Gotos and syncs move the reported position instantly; a goto also starts
/// a countdown of `slew_polls` during which `L` reports slewing. Unknown
/// commands get no reply, which reads as a timeout.
///
/// `SimulatedMount` is its own opener: each `open` hands out a copy of the
/// current state, so inspect the controller's channel rather than the
/// opener after running commands.
///
/// # Example
///
/// ```rust
/// use synscan_mount::{MountController, PointingMode, Equatorial, Horizontal};
/// use synscan_mount::hal::SimulatedMount;
///
/// let sim = SimulatedMount::new().with_azm_alt(Horizontal::new(100.0, 60.0));
/// let mut mount = MountController::new(sim);
/// mount.set_pointing_mode(PointingMode::Mirror);
///
/// let corrected = mount.goto_ra_dec(Equatorial::new(10.0, 20.0)).unwrap().unwrap();
/// assert!((corrected.alt - 75.0).abs() < 1e-3);
/// ```
#[derive(Clone, Debug)]
pub struct SimulatedMount {
    /// Reported RA/Dec.
    pub ra_dec: Equatorial,
    /// Reported Azm/Alt.
    pub azm_alt: Horizontal,
    /// Last tracking mode received.
    pub tracking: Option<TrackingMode>,
    /// Number of `L` polls that report slewing after each goto.
    pub slew_polls: u32,
    /// Remaining polls of the current slew.
    pub slewing_remaining: u32,
    /// Firmware version reported by `V`.
    pub version: FirmwareVersion,
    /// Model identifier reported by `m`.
    pub model: u8,
    /// Alignment flag reported by `J`.
    pub aligned: bool,
    /// Pier side reported by `p`.
    pub pier_side: PierSide,
    /// Every frame received, in order.
    pub received: Vec<Vec<u8>>,
    reply: VecDeque<u8>,
}

impl Default for SimulatedMount {
    fn default() -> Self {
        Self {
            ra_dec: Equatorial::default(),
            azm_alt: Horizontal::default(),
            tracking: None,
            slew_polls: 0,
            slewing_remaining: 0,
            version: FirmwareVersion { major: 4, minor: 39 },
            model: 1,
            aligned: true,
            pier_side: PierSide::East,
            received: Vec::new(),
            reply: VecDeque::new(),
        }
    }
}

impl SimulatedMount {
    /// Creates a simulated mount parked at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reported Azm/Alt.
    pub fn with_azm_alt(mut self, azm_alt: Horizontal) -> Self {
        self.azm_alt = azm_alt;
        self
    }

    /// Set the reported RA/Dec.
    pub fn with_ra_dec(mut self, ra_dec: Equatorial) -> Self {
        self.ra_dec = ra_dec;
        self
    }

    /// Make each goto report slewing for `polls` queries.
    pub fn with_slew_polls(mut self, polls: u32) -> Self {
        self.slew_polls = polls;
        self
    }

    fn position_reply(precision: PrecisionMode, first: f64, second: f64) -> Vec<u8> {
        let mut reply = encode_pair(precision, first, second).into_bytes();
        reply.push(TERMINATOR);
        reply
    }

    fn target(precision: PrecisionMode, payload: &[u8]) -> Option<(f64, f64)> {
        let mut framed = payload.to_vec();
        framed.push(TERMINATOR);
        decode_position(&framed, precision).ok()
    }

    /// Compute the reply to one request frame, if any.
    fn respond(&mut self, frame: &[u8]) -> Option<Vec<u8>> {
        let (&code, payload) = frame.split_first()?;
        let precision = if code.is_ascii_lowercase() {
            PrecisionMode::Precise
        } else {
            PrecisionMode::Coarse
        };
        let ack = vec![TERMINATOR];

        match code {
            b'E' | b'e' => Some(Self::position_reply(precision, self.ra_dec.ra, self.ra_dec.dec)),
            b'Z' | b'z' => Some(Self::position_reply(precision, self.azm_alt.azm, self.azm_alt.alt)),
            b'R' | b'r' => {
                let (ra, dec) = Self::target(precision, payload)?;
                self.ra_dec = Equatorial::new(ra, dec);
                self.slewing_remaining = self.slew_polls;
                Some(ack)
            }
            b'B' | b'b' => {
                let (azm, alt) = Self::target(precision, payload)?;
                self.azm_alt = Horizontal::new(azm, alt);
                self.slewing_remaining = self.slew_polls;
                Some(ack)
            }
            b'S' | b's' => {
                let (ra, dec) = Self::target(precision, payload)?;
                self.ra_dec = Equatorial::new(ra, dec);
                Some(ack)
            }
            b'T' => {
                let &[raw] = payload else { return None };
                self.tracking = Some(TrackingMode::try_from(raw).ok()?);
                Some(ack)
            }
            b'L' => {
                let slewing = self.slewing_remaining > 0;
                self.slewing_remaining = self.slewing_remaining.saturating_sub(1);
                Some(if slewing { b"1#".to_vec() } else { b"0#".to_vec() })
            }
            b'M' => {
                self.slewing_remaining = 0;
                Some(ack)
            }
            b'V' => Some(vec![self.version.major, self.version.minor, TERMINATOR]),
            b'm' => Some(vec![self.model, TERMINATOR]),
            b'K' => {
                let &[byte] = payload else { return None };
                Some(vec![byte, TERMINATOR])
            }
            b'J' => Some(vec![u8::from(self.aligned), TERMINATOR]),
            b'p' => {
                let side = match self.pier_side {
                    PierSide::East => b'E',
                    PierSide::West => b'W',
                };
                Some(vec![side, TERMINATOR])
            }
            _ => None,
        }
    }
}

impl MountChannel for SimulatedMount {
    fn write(&mut self, bytes: &[u8]) -> Result<(), ChannelError> {
        self.received.push(bytes.to_vec());
        if let Some(reply) = self.respond(bytes) {
            self.reply.extend(reply);
        }
        Ok(())
    }

    fn read(&mut self, max_bytes: usize) -> Result<Vec<u8>, ChannelError> {
        if self.reply.is_empty() {
            return Err(ChannelError::Timeout);
        }

        let take = max_bytes.min(self.reply.len());
        Ok(self.reply.drain(..take).collect())
    }

    fn clear_input(&mut self) -> Result<(), ChannelError> {
        self.reply.clear();
        Ok(())
    }
}

impl ChannelOpener for SimulatedMount {
    type Channel = SimulatedMount;

    fn open(&mut self) -> Result<SimulatedMount, ChannelError> {
        let mut channel = self.clone();
        channel.reply.clear();
        Ok(channel)
    }

    fn describe(&self) -> String {
        String::from("simulated mount")
    }
}
