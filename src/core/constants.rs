//! Protocol constants for the RDT 2.2 wire format.
//!
//! These values are fixed by the wire format and MUST NOT be changed; both
//! endpoints rely on them to classify and parse frames.

use std::time::Duration;

// =============================================================================
// DATA FRAME
// =============================================================================

/// Total size of every data frame on the wire.
pub const FULL_SIZE: usize = 1024;

/// Data frame header size (1 bit sequence + 15 bit payload length).
pub const DATA_HEADER_SIZE: usize = 2;

/// Trailing checksum size, shared by both frame kinds.
pub const CHECKSUM_SIZE: usize = 2;

/// Maximum payload carried by one data frame.
pub const DATA_SIZE: usize = FULL_SIZE - DATA_HEADER_SIZE - CHECKSUM_SIZE;

/// Header mask selecting the sequence bit.
pub const SEQ_BIT_MASK: u16 = 1 << 15;

/// Header mask selecting the payload length.
pub const LENGTH_MASK: u16 = 0x7FFF;

// =============================================================================
// ACK FRAME
// =============================================================================

/// Total size of an ACK frame on the wire.
pub const ACK_SIZE: usize = 4;

/// Fixed marker byte following the ACK sequence byte.
pub const ACK_MARKER: u8 = 0xAA;

// =============================================================================
// TIMING
// =============================================================================

/// Default sender wait for an ACK before retransmitting.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_millis(500);

/// Default time the receiver keeps answering retransmissions after the final unit.
pub const DEFAULT_LINGER: Duration = Duration::from_secs(1);

// =============================================================================
// STREAM LAYER
// =============================================================================

/// Size of the unit-count header that precedes a stream.
pub const STREAM_HEADER_SIZE: usize = 8;
