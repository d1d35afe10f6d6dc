//! Transport layer error types.
//!
//! Corruption and sequence mismatches never surface here: the state machines
//! absorb them by retransmitting. What remains is fatal to the session.

use std::io;

use thiserror::Error;

use super::frame::PacketError;

/// Transport layer errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Payload could not be framed.
    #[error("packet error: {0}")]
    Packet(#[from] PacketError),

    /// I/O error (socket operations).
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// The underlying channel is closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// Give-up policy reached while waiting for an ACK.
    #[error("max retransmits exceeded after {attempts} attempts")]
    MaxRetransmitsExceeded {
        /// Retransmissions performed before giving up.
        attempts: u32,
    },
}

impl TransportError {
    /// Check if this error is fatal to the session.
    ///
    /// Only a rejected payload leaves the session usable; the caller can
    /// re-chunk and try again.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TransportError::Packet(_))
    }

    /// Classify an I/O error, mapping channel shutdown to `ConnectionClosed`.
    pub fn from_io(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof => TransportError::ConnectionClosed,
            _ => TransportError::Io(err),
        }
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
