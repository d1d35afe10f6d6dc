//! Frame encoding and decoding for the RDT 2.2 wire format.
//!
//! Two frame kinds share the wire with no explicit type tag. A datagram is an
//! ACK iff it is exactly [`ACK_SIZE`] bytes long and its second byte is
//! [`ACK_MARKER`]; everything else is treated as data.
//!
//! Callers MUST check [`is_corrupt`] (or use [`Frame::decode`], which does)
//! before trusting any field: a corrupted length field is garbage. The
//! length clamp in [`extract_payload`] only keeps extraction in bounds.

use std::fmt;

use thiserror::Error;

use super::checksum;
use crate::core::constants::{
    ACK_MARKER, ACK_SIZE, CHECKSUM_SIZE, DATA_HEADER_SIZE, DATA_SIZE, FULL_SIZE, LENGTH_MASK,
    SEQ_BIT_MASK,
};

/// One-bit sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum SeqNum {
    /// Sequence 0.
    #[default]
    Zero = 0,
    /// Sequence 1.
    One = 1,
}

impl SeqNum {
    /// Parse a sequence number from a bit value; anything but 0/1 is `None`.
    pub fn from_bit(bit: u8) -> Option<Self> {
        match bit {
            0 => Some(Self::Zero),
            1 => Some(Self::One),
            _ => None,
        }
    }

    /// Bit value of this sequence number.
    pub fn as_bit(self) -> u8 {
        self as u8
    }

    /// The other sequence number.
    #[must_use]
    pub fn flip(self) -> Self {
        match self {
            Self::Zero => Self::One,
            Self::One => Self::Zero,
        }
    }
}

impl fmt::Display for SeqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_bit())
    }
}

/// Frame kinds distinguished by the length+marker rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Data frame.
    Data,
    /// Acknowledgment frame.
    Ack,
}

impl FrameKind {
    /// Classify raw bytes.
    pub fn of(frame: &[u8]) -> Self {
        if is_ack(frame) { Self::Ack } else { Self::Data }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data => f.write_str("DATA"),
            Self::Ack => f.write_str("ACK"),
        }
    }
}

/// Errors raised when building a frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PacketError {
    /// Payload does not fit in a single data frame.
    #[error("payload too large: {len} bytes (maximum {max})")]
    PayloadTooLarge {
        /// Payload length supplied.
        len: usize,
        /// Maximum payload length.
        max: usize,
    },
}

/// Outcomes of decoding that yield no usable frame.
///
/// These are expected on a lossy channel and are handled by retransmission,
/// never by aborting the session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Checksum mismatch.
    #[error("checksum mismatch: computed 0x{computed:04x}, frame carries 0x{received:04x}")]
    Corrupt {
        /// Checksum computed over the received bytes.
        computed: u16,
        /// Checksum carried in the frame trailer.
        received: u16,
    },

    /// Frame is too short to hold a header and checksum.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        /// Minimum expected size.
        expected: usize,
        /// Actual size received.
        actual: usize,
    },

    /// Intact ACK whose sequence byte is neither 0 nor 1.
    #[error("invalid ACK sequence byte 0x{0:02x}")]
    InvalidSequence(u8),

    /// Frame is intact but of the other kind.
    #[error("expected a {expected} frame, got {actual}")]
    WrongKind {
        /// Kind the caller asked for.
        expected: FrameKind,
        /// Kind the frame classifies as.
        actual: FrameKind,
    },
}

/// A decoded data frame.
///
/// Wire format (1024 bytes):
/// ```text
/// +-----+------------+-----------------+-------------+------------+
/// | Seq | Length     | Payload         | Zero pad    | Checksum   |
/// | 1 b | 15 bits    | Length bytes    | to 1022     | 2 bytes BE |
/// +-----+------------+-----------------+-------------+------------+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPacket {
    seq: SeqNum,
    payload: Vec<u8>,
}

impl DataPacket {
    /// Create a data packet, rejecting payloads above [`DATA_SIZE`].
    pub fn new(payload: impl Into<Vec<u8>>, seq: SeqNum) -> Result<Self, PacketError> {
        let payload = payload.into();
        if payload.len() > DATA_SIZE {
            return Err(PacketError::PayloadTooLarge {
                len: payload.len(),
                max: DATA_SIZE,
            });
        }
        Ok(Self { seq, payload })
    }

    /// Sequence bit.
    pub fn seq(&self) -> SeqNum {
        self.seq
    }

    /// Payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Take the payload out of the packet.
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Serialize to a full [`FULL_SIZE`]-byte frame.
    pub fn to_bytes(&self) -> Vec<u8> {
        // Length fits in 15 bits and in the frame: `new` is the only constructor.
        let header = (u16::from(self.seq.as_bit()) << 15) | (self.payload.len() as u16 & LENGTH_MASK);

        let mut buf = vec![0u8; FULL_SIZE];
        buf[..DATA_HEADER_SIZE].copy_from_slice(&header.to_be_bytes());
        buf[DATA_HEADER_SIZE..DATA_HEADER_SIZE + self.payload.len()].copy_from_slice(&self.payload);

        let body_end = FULL_SIZE - CHECKSUM_SIZE;
        let sum = checksum::fold(&buf[..body_end]);
        buf[body_end..].copy_from_slice(&sum.to_be_bytes());
        buf
    }
}

/// A decoded ACK frame.
///
/// Wire format (4 bytes):
/// ```text
/// +--------+--------+------------+
/// | Seq    | Marker | Checksum   |
/// | 1 byte | 0xAA   | 2 bytes BE |
/// +--------+--------+------------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckPacket {
    /// Acknowledged sequence bit.
    pub seq: SeqNum,
}

impl AckPacket {
    /// Create an ACK for `seq`.
    pub fn new(seq: SeqNum) -> Self {
        Self { seq }
    }

    /// Serialize to a 4-byte frame.
    pub fn to_bytes(&self) -> [u8; ACK_SIZE] {
        let mut buf = [0u8; ACK_SIZE];
        buf[0] = self.seq.as_bit();
        buf[1] = ACK_MARKER;
        let sum = checksum::fold(&buf[..ACK_SIZE - CHECKSUM_SIZE]);
        buf[ACK_SIZE - CHECKSUM_SIZE..].copy_from_slice(&sum.to_be_bytes());
        buf
    }
}

/// A verified frame of either kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Data frame.
    Data(DataPacket),
    /// Acknowledgment frame.
    Ack(AckPacket),
}

impl Frame {
    /// Verify, classify, and decode raw bytes.
    pub fn decode(frame: &[u8]) -> Result<Self, FrameError> {
        match FrameKind::of(frame) {
            FrameKind::Ack => decode_ack(frame).map(Self::Ack),
            FrameKind::Data => decode_data(frame).map(Self::Data),
        }
    }

    /// Kind of this frame.
    pub fn kind(&self) -> FrameKind {
        match self {
            Self::Data(_) => FrameKind::Data,
            Self::Ack(_) => FrameKind::Ack,
        }
    }

    /// Sequence bit carried by this frame.
    pub fn seq(&self) -> SeqNum {
        match self {
            Self::Data(packet) => packet.seq,
            Self::Ack(packet) => packet.seq,
        }
    }
}

/// Verify the trailing checksum of `frame`.
fn check(frame: &[u8], min_len: usize) -> Result<(), FrameError> {
    if frame.len() < min_len {
        return Err(FrameError::TooShort {
            expected: min_len,
            actual: frame.len(),
        });
    }

    let (body, trailer) = frame.split_at(frame.len() - CHECKSUM_SIZE);
    let received = u16::from_be_bytes([trailer[0], trailer[1]]);
    let computed = checksum::fold(body);
    if computed != received {
        return Err(FrameError::Corrupt { computed, received });
    }
    Ok(())
}

/// Build a data frame carrying `payload` with sequence bit `seq`.
pub fn encode_data(payload: &[u8], seq: SeqNum) -> Result<Vec<u8>, PacketError> {
    Ok(DataPacket::new(payload, seq)?.to_bytes())
}

/// Verify and decode a data frame.
pub fn decode_data(frame: &[u8]) -> Result<DataPacket, FrameError> {
    check(frame, DATA_HEADER_SIZE + CHECKSUM_SIZE)?;

    if is_ack(frame) {
        return Err(FrameError::WrongKind {
            expected: FrameKind::Data,
            actual: FrameKind::Ack,
        });
    }

    let header = u16::from_be_bytes([frame[0], frame[1]]);
    let seq = if header & SEQ_BIT_MASK == 0 { SeqNum::Zero } else { SeqNum::One };
    Ok(DataPacket {
        seq,
        payload: extract_payload(frame).to_vec(),
    })
}

/// Build an ACK frame for `seq`.
pub fn encode_ack(seq: SeqNum) -> [u8; ACK_SIZE] {
    AckPacket::new(seq).to_bytes()
}

/// Verify and decode an ACK frame.
pub fn decode_ack(frame: &[u8]) -> Result<AckPacket, FrameError> {
    check(frame, ACK_SIZE)?;

    if !is_ack(frame) {
        return Err(FrameError::WrongKind {
            expected: FrameKind::Ack,
            actual: FrameKind::Data,
        });
    }

    let seq = SeqNum::from_bit(frame[0]).ok_or(FrameError::InvalidSequence(frame[0]))?;
    Ok(AckPacket { seq })
}

/// Whether `frame` fails checksum verification. Frames of two bytes or
/// fewer are always corrupt.
pub fn is_corrupt(frame: &[u8]) -> bool {
    if frame.len() <= CHECKSUM_SIZE {
        return true;
    }
    let (body, trailer) = frame.split_at(frame.len() - CHECKSUM_SIZE);
    !checksum::verify(body, u16::from_be_bytes([trailer[0], trailer[1]]))
}

/// Whether `frame` classifies as an ACK.
pub fn is_ack(frame: &[u8]) -> bool {
    frame.len() == ACK_SIZE && frame[1] == ACK_MARKER
}

/// Whether `frame` classifies as data.
pub fn is_data(frame: &[u8]) -> bool {
    !is_ack(frame)
}

/// Sequence bit of a data frame; `None` for ACKs and frames under two bytes.
pub fn data_sequence(frame: &[u8]) -> Option<SeqNum> {
    if !is_data(frame) || frame.len() < DATA_HEADER_SIZE {
        return None;
    }
    let header = u16::from_be_bytes([frame[0], frame[1]]);
    SeqNum::from_bit(((header & SEQ_BIT_MASK) >> 15) as u8)
}

/// Sequence bit of an ACK frame; `None` for data frames or an out-of-range byte.
pub fn ack_sequence(frame: &[u8]) -> Option<SeqNum> {
    if !is_ack(frame) {
        return None;
    }
    SeqNum::from_bit(frame[0])
}

/// Payload slice of a data frame, with the length field clamped to the bytes
/// actually present. Empty for ACKs and undersized frames.
pub fn extract_payload(frame: &[u8]) -> &[u8] {
    if !is_data(frame) || frame.len() < DATA_HEADER_SIZE + CHECKSUM_SIZE {
        return &[];
    }
    let header = u16::from_be_bytes([frame[0], frame[1]]);
    let available = frame.len() - DATA_HEADER_SIZE - CHECKSUM_SIZE;
    let len = usize::from(header & LENGTH_MASK).min(available);
    &frame[DATA_HEADER_SIZE..DATA_HEADER_SIZE + len]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn flip_bit(frame: &[u8], byte: usize, bit: u8) -> Vec<u8> {
        let mut out = frame.to_vec();
        out[byte] ^= 1 << bit;
        out
    }

    #[test]
    fn test_seq_num() {
        assert_eq!(SeqNum::from_bit(0), Some(SeqNum::Zero));
        assert_eq!(SeqNum::from_bit(1), Some(SeqNum::One));
        assert_eq!(SeqNum::from_bit(2), None);
        assert_eq!(SeqNum::Zero.flip(), SeqNum::One);
        assert_eq!(SeqNum::One.flip().flip(), SeqNum::One);
        assert_eq!(SeqNum::default(), SeqNum::Zero);
    }

    #[test]
    fn test_ack_wire_format() {
        assert_eq!(hex::encode(encode_ack(SeqNum::Zero)), "00aa00aa");
        assert_eq!(hex::encode(encode_ack(SeqNum::One)), "01aa01aa");
    }

    #[test]
    fn test_data_wire_format() {
        let frame = encode_data(b"AB", SeqNum::Zero).unwrap();
        assert_eq!(frame.len(), FULL_SIZE);
        assert_eq!(hex::encode(&frame[..4]), "00024142");
        assert!(frame[4..FULL_SIZE - 2].iter().all(|&b| b == 0));
        // 0x0002 ^ 0x4142
        assert_eq!(hex::encode(&frame[FULL_SIZE - 2..]), "4140");

        let frame = encode_data(&[], SeqNum::One).unwrap();
        assert_eq!(hex::encode(&frame[..2]), "8000");
        assert_eq!(hex::encode(&frame[FULL_SIZE - 2..]), "8000");
    }

    #[test]
    fn test_payload_too_large() {
        let payload = vec![0u8; DATA_SIZE + 1];
        assert_eq!(
            encode_data(&payload, SeqNum::Zero),
            Err(PacketError::PayloadTooLarge {
                len: DATA_SIZE + 1,
                max: DATA_SIZE
            })
        );
        assert!(encode_data(&payload[..DATA_SIZE], SeqNum::Zero).is_ok());
    }

    #[test]
    fn test_data_roundtrip_both_seqs() {
        for seq in [SeqNum::Zero, SeqNum::One] {
            let payload = [0xDE, 0xAD, 0xBE, 0xAF];
            let frame = encode_data(&payload, seq).unwrap();
            let packet = decode_data(&frame).unwrap();
            assert_eq!(packet.seq(), seq);
            assert_eq!(packet.payload(), payload.as_slice());
        }
    }

    #[test]
    fn test_ack_roundtrip_both_seqs() {
        for seq in [SeqNum::Zero, SeqNum::One] {
            let frame = encode_ack(seq);
            assert_eq!(decode_ack(&frame), Ok(AckPacket { seq }));
        }
    }

    #[test]
    fn test_classification() {
        let ack = encode_ack(SeqNum::One);
        let data = encode_data(b"hi", SeqNum::One).unwrap();

        assert!(is_ack(&ack));
        assert!(!is_data(&ack));
        assert!(is_data(&data));
        assert!(!is_ack(&data));

        // Right length, wrong marker: data.
        assert!(is_data(&[0x01, 0xAB, 0x00, 0x00]));
        // Empty input classifies as data too.
        assert!(is_data(&[]));
        assert_eq!(FrameKind::of(&ack), FrameKind::Ack);
    }

    #[test]
    fn test_is_corrupt() {
        assert!(is_corrupt(&[]));
        assert!(is_corrupt(&[0x00, 0x00]));
        assert!(!is_corrupt(&encode_ack(SeqNum::Zero)));

        let data = encode_data(b"payload", SeqNum::Zero).unwrap();
        assert!(!is_corrupt(&data));
        assert!(is_corrupt(&flip_bit(&data, 500, 3)));
    }

    #[test]
    fn test_checksum_bit_flip_rejected() {
        let data = encode_data(b"xyz", SeqNum::One).unwrap();
        let damaged = flip_bit(&data, FULL_SIZE - 1, 0);
        assert!(matches!(decode_data(&damaged), Err(FrameError::Corrupt { .. })));

        let ack = encode_ack(SeqNum::One);
        let damaged = flip_bit(&ack, 2, 7);
        assert!(matches!(decode_ack(&damaged), Err(FrameError::Corrupt { .. })));
    }

    #[test]
    fn test_sequence_sentinels() {
        let ack = encode_ack(SeqNum::One);
        let data = encode_data(b"x", SeqNum::One).unwrap();

        assert_eq!(data_sequence(&data), Some(SeqNum::One));
        assert_eq!(ack_sequence(&ack), Some(SeqNum::One));
        assert_eq!(data_sequence(&ack), None);
        assert_eq!(ack_sequence(&data), None);
        assert_eq!(data_sequence(&[0x80]), None);
        assert_eq!(ack_sequence(&[0x07, ACK_MARKER, 0x07, ACK_MARKER]), None);
    }

    #[test]
    fn test_extract_payload_clamps_length() {
        assert_eq!(extract_payload(&encode_ack(SeqNum::Zero)), b"");
        assert_eq!(extract_payload(&[0x00, 0x05, 0x00]), b"");

        // Length field claims 0x7FFF bytes but only 3 are present.
        let frame = [0x7F, 0xFF, 0x01, 0x02, 0x03, 0x00, 0x00];
        assert_eq!(extract_payload(&frame), &[0x01, 0x02, 0x03]);
    }

    #[test]
    fn test_decode_wrong_kind() {
        let ack = encode_ack(SeqNum::Zero);
        assert_eq!(
            decode_data(&ack),
            Err(FrameError::WrongKind {
                expected: FrameKind::Data,
                actual: FrameKind::Ack
            })
        );

        let data = encode_data(b"", SeqNum::Zero).unwrap();
        assert!(matches!(decode_ack(&data), Err(FrameError::WrongKind { .. })));
    }

    #[test]
    fn test_decode_too_short() {
        assert_eq!(
            decode_data(&[0x00, 0x00]),
            Err(FrameError::TooShort {
                expected: 4,
                actual: 2
            })
        );
        assert!(matches!(decode_ack(&[0x00]), Err(FrameError::TooShort { .. })));
    }

    #[test]
    fn test_frame_decode_tagged() {
        let frame = Frame::decode(&encode_ack(SeqNum::One)).unwrap();
        assert_eq!(frame.kind(), FrameKind::Ack);
        assert_eq!(frame.seq(), SeqNum::One);

        let frame = Frame::decode(&encode_data(b"CD", SeqNum::Zero).unwrap()).unwrap();
        assert_eq!(
            frame,
            Frame::Data(DataPacket::new(b"CD".to_vec(), SeqNum::Zero).unwrap())
        );
    }

    #[test]
    fn test_oversized_payload_is_construction_error() {
        for len in [DATA_SIZE + 1, 2000, usize::from(LENGTH_MASK) + 1] {
            let payload = vec![0u8; len];
            assert_eq!(
                DataPacket::new(payload.clone(), SeqNum::Zero),
                Err(PacketError::PayloadTooLarge { len, max: DATA_SIZE })
            );
            assert_eq!(
                encode_data(&payload, SeqNum::One),
                Err(PacketError::PayloadTooLarge { len, max: DATA_SIZE })
            );
        }

        let packet = DataPacket::new(vec![9u8; DATA_SIZE], SeqNum::One).unwrap();
        assert_eq!(packet.to_bytes().len(), FULL_SIZE);
        assert_eq!(packet.payload().len(), DATA_SIZE);
        assert_eq!(packet.into_payload(), vec![9u8; DATA_SIZE]);
    }

    #[test]
    fn test_ack_with_invalid_sequence_byte() {
        let mut ack = [0x07, ACK_MARKER, 0, 0];
        let sum = checksum::fold(&ack[..2]);
        ack[2..].copy_from_slice(&sum.to_be_bytes());

        assert!(!is_corrupt(&ack));
        assert_eq!(decode_ack(&ack), Err(FrameError::InvalidSequence(0x07)));
        assert_eq!(ack_sequence(&ack), None);
        assert_eq!(
            FrameError::InvalidSequence(0x07).to_string(),
            "invalid ACK sequence byte 0x07"
        );
    }

    proptest! {
        #[test]
        fn prop_data_roundtrip(
            payload in proptest::collection::vec(any::<u8>(), 0..=DATA_SIZE),
            one in any::<bool>(),
        ) {
            let seq = if one { SeqNum::One } else { SeqNum::Zero };
            let frame = encode_data(&payload, seq).unwrap();
            prop_assert_eq!(frame.len(), FULL_SIZE);

            let packet = decode_data(&frame).unwrap();
            prop_assert_eq!(packet.seq(), seq);
            prop_assert_eq!(packet.payload(), payload.as_slice());
        }

        #[test]
        fn prop_checksum_flip_never_decodes(
            payload in proptest::collection::vec(any::<u8>(), 0..64),
            bit in 0u8..16,
        ) {
            let frame = encode_data(&payload, SeqNum::Zero).unwrap();
            let byte = FULL_SIZE - 2 + usize::from(bit / 8);
            let damaged = flip_bit(&frame, byte, bit % 8);
            prop_assert!(decode_data(&damaged).is_err());
            prop_assert!(is_corrupt(&damaged));
        }
    }
}
