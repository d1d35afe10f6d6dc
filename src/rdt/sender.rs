//! Sender-side state machine
//!
//! Alternating-bit sender with one frame in flight. The machine performs no
//! I/O: every operation hands back the bytes to put on the wire.

use crate::transport::{PacketError, SeqNum, ack_sequence, encode_data, is_corrupt};

/// Sender states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SenderState {
    /// Ready to accept a unit, which will go out with sequence 0.
    #[default]
    WaitCall0,
    /// Sequence 0 in flight.
    WaitAck0,
    /// Ready to accept a unit, which will go out with sequence 1.
    WaitCall1,
    /// Sequence 1 in flight.
    WaitAck1,
}

impl SenderState {
    /// Sequence bit this state sends with or expects an ACK for.
    pub fn seq(self) -> SeqNum {
        match self {
            Self::WaitCall0 | Self::WaitAck0 => SeqNum::Zero,
            Self::WaitCall1 | Self::WaitAck1 => SeqNum::One,
        }
    }

    /// Whether a frame is in flight.
    pub fn is_waiting(self) -> bool {
        matches!(self, Self::WaitAck0 | Self::WaitAck1)
    }

    fn awaiting(seq: SeqNum) -> Self {
        match seq {
            SeqNum::Zero => Self::WaitAck0,
            SeqNum::One => Self::WaitAck1,
        }
    }

    fn ready_for(seq: SeqNum) -> Self {
        match seq {
            SeqNum::Zero => Self::WaitCall0,
            SeqNum::One => Self::WaitCall1,
        }
    }
}

/// Result of feeding an incoming frame to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome<'a> {
    /// Good ACK for the frame in flight; ready for the next unit.
    Acknowledged,
    /// Corrupt or wrong-sequence ACK; these bytes must be resent.
    Retransmit(&'a [u8]),
    /// Nothing in flight, frame ignored.
    Ignored,
}

impl AckOutcome<'_> {
    /// Whether the caller has to put a frame back on the wire.
    pub fn is_retransmit(&self) -> bool {
        matches!(self, AckOutcome::Retransmit(_))
    }
}

/// Alternating-bit sender.
#[derive(Debug, Clone, Default)]
pub struct Sender {
    /// Current state.
    state: SenderState,

    /// Last frame transmitted, kept until acknowledged
    last_frame: Option<Vec<u8>>,

    /// Retransmissions of the frame in flight
    retransmits: u32,

    /// Units acknowledged so far
    acknowledged: u64,
}

impl Sender {
    /// Create a sender in `WaitCall0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> SenderState {
        self.state
    }

    /// Whether a new unit can be accepted.
    pub fn is_ready(&self) -> bool {
        !self.state.is_waiting()
    }

    /// Frame currently in flight, if any.
    pub fn in_flight(&self) -> Option<&[u8]> {
        if self.state.is_waiting() {
            self.last_frame.as_deref()
        } else {
            None
        }
    }

    /// Retransmissions of the frame in flight.
    pub fn retransmits(&self) -> u32 {
        self.retransmits
    }

    /// Units acknowledged since creation.
    pub fn acknowledged(&self) -> u64 {
        self.acknowledged
    }

    /// Frame `unit` and move to the matching `WaitAck` state.
    ///
    /// Returns the frame to transmit. While a frame is in flight this is a
    /// no-op returning `Ok(None)`: the alternating-bit discipline allows one
    /// outstanding unit. An oversized unit fails without changing state.
    pub fn send(&mut self, unit: &[u8]) -> Result<Option<&[u8]>, PacketError> {
        if self.state.is_waiting() {
            tracing::trace!(state = ?self.state, "send while waiting for ACK ignored");
            return Ok(None);
        }

        let seq = self.state.seq();
        let frame = encode_data(unit, seq)?;
        self.state = SenderState::awaiting(seq);
        self.retransmits = 0;
        tracing::debug!(%seq, len = unit.len(), "sending unit");

        Ok(Some(self.last_frame.insert(frame).as_slice()))
    }

    /// The ACK timer expired: resend the frame in flight, state unchanged.
    pub fn on_timeout(&mut self) -> Option<&[u8]> {
        if !self.state.is_waiting() {
            return None;
        }
        self.retransmits += 1;
        tracing::debug!(seq = %self.state.seq(), retransmits = self.retransmits, "ACK timeout, retransmitting");
        self.last_frame.as_deref()
    }

    /// Process a frame from the receiver.
    ///
    /// Only an intact ACK carrying the expected bit advances the machine.
    /// Anything else while waiting means the frame in flight is resent.
    pub fn on_receive(&mut self, frame: &[u8]) -> AckOutcome<'_> {
        if !self.state.is_waiting() {
            return AckOutcome::Ignored;
        }

        let expected = self.state.seq();
        if !is_corrupt(frame) && ack_sequence(frame) == Some(expected) {
            self.state = SenderState::ready_for(expected.flip());
            self.acknowledged += 1;
            tracing::debug!(seq = %expected, retransmits = self.retransmits, "unit acknowledged");
            return AckOutcome::Acknowledged;
        }

        self.retransmits += 1;
        tracing::debug!(
            seq = %expected,
            corrupt = is_corrupt(frame),
            got = ?ack_sequence(frame),
            "bad ACK, retransmitting"
        );
        match self.last_frame.as_deref() {
            Some(last) => AckOutcome::Retransmit(last),
            None => AckOutcome::Ignored,
        }
    }

    /// Reset to `WaitCall0`, forgetting any frame in flight.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
