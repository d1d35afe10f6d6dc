//! Receiver-side state machine
//!
//! Accepts only the expected sequence bit and answers everything else at the
//! ACK layer, so payloads are delivered exactly once and in order.

use crate::core::constants::ACK_SIZE;
use crate::transport::{SeqNum, data_sequence, encode_ack, extract_payload, is_corrupt};

/// Receiver states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReceiverState {
    /// Expecting a data frame with sequence 0.
    #[default]
    WaitSeq0,
    /// Expecting a data frame with sequence 1.
    WaitSeq1,
}

impl ReceiverState {
    /// Sequence bit this state accepts.
    pub fn expected(self) -> SeqNum {
        match self {
            Self::WaitSeq0 => SeqNum::Zero,
            Self::WaitSeq1 => SeqNum::One,
        }
    }

    fn expecting(seq: SeqNum) -> Self {
        match seq {
            SeqNum::Zero => Self::WaitSeq0,
            SeqNum::One => Self::WaitSeq1,
        }
    }
}

/// Result of feeding a frame to the receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// New in-order payload; `ack` must be sent back.
    Delivered {
        /// Payload to hand to the application.
        payload: Vec<u8>,
        /// ACK frame for the delivered sequence bit.
        ack: [u8; ACK_SIZE],
    },
    /// Corrupt or duplicate frame; nothing delivered.
    Rejected {
        /// Most recent ACK to resend, if any has been sent in this session.
        ack: Option<[u8; ACK_SIZE]>,
    },
}

impl ReceiveOutcome {
    /// ACK to put on the wire, if any.
    pub fn ack(&self) -> Option<&[u8]> {
        match self {
            Self::Delivered { ack, .. } => Some(ack.as_slice()),
            Self::Rejected { ack } => ack.as_ref().map(|ack| ack.as_slice()),
        }
    }

    /// Delivered payload, if any.
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            Self::Delivered { payload, .. } => Some(payload.as_slice()),
            Self::Rejected { .. } => None,
        }
    }
}

/// Alternating-bit receiver.
#[derive(Debug, Clone, Default)]
pub struct Receiver {
    /// Current state
    state: ReceiverState,

    /// Last ACK sent for each sequence value, indexed by bit
    last_acks: [Option<[u8; ACK_SIZE]>; 2],

    /// Set once the first in-order frame of the session was delivered
    delivered_any: bool,

    /// Units delivered
    delivered: u64,

    /// Frames rejected as corrupt or duplicate
    rejected: u64,
}

impl Receiver {
    /// Create a receiver in `WaitSeq0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> ReceiverState {
        self.state
    }

    /// Whether at least one unit has been delivered.
    pub fn has_delivered(&self) -> bool {
        self.delivered_any
    }

    /// Units delivered since creation.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Frames rejected since creation.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Process one incoming frame.
    pub fn receive(&mut self, frame: &[u8]) -> ReceiveOutcome {
        let expected = self.state.expected();

        if !is_corrupt(frame) && data_sequence(frame) == Some(expected) {
            let payload = extract_payload(frame).to_vec();
            let ack = encode_ack(expected);
            self.last_acks[usize::from(expected.as_bit())] = Some(ack);
            self.state = ReceiverState::expecting(expected.flip());
            self.delivered_any = true;
            self.delivered += 1;
            tracing::debug!(seq = %expected, len = payload.len(), "delivered unit");
            return ReceiveOutcome::Delivered { payload, ack };
        }

        self.rejected += 1;

        // The most recent ACK is the one for the other bit. Before anything was
        // delivered there is none, so the first frames of a session never draw
        // an ACK they could mistake for their own.
        let ack = if self.delivered_any {
            self.last_acks[usize::from(expected.flip().as_bit())]
        } else {
            None
        };
        tracing::debug!(
            expected = %expected,
            corrupt = is_corrupt(frame),
            got = ?data_sequence(frame),
            reack = ack.is_some(),
            "rejected frame"
        );
        ReceiveOutcome::Rejected { ack }
    }

    /// Reset to `WaitSeq0` for a new session.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
