//! Error types for the RDT protocol.

use thiserror::Error;

use crate::transport::{FrameError, PacketError, TransportError};

/// Errors raised while validating configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Loss probability is negative, NaN, or above 100 percent.
    #[error("invalid loss probability: {0} (expected a 0-1 fraction or a 0-100 percentage)")]
    InvalidLossProbability(f64),

    /// A timeout of zero would retransmit in a busy loop.
    #[error("timeout must be greater than zero")]
    ZeroTimeout,

    /// Scenario selector not recognised.
    #[error("unknown scenario: {0}")]
    UnknownScenario(String),
}

/// Errors in the stream layer.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The first unit of a stream did not carry a unit count.
    #[error("malformed stream header: expected {expected} bytes, got {actual}")]
    MalformedHeader {
        /// Expected header length.
        expected: usize,
        /// Length of the unit actually received.
        actual: usize,
    },

    /// Transport failure while moving units.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Top-level RDT errors.
#[derive(Debug, Error)]
pub enum RdtError {
    /// Payload could not be framed.
    #[error("packet error: {0}")]
    Packet(#[from] PacketError),

    /// Frame could not be decoded.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Stream error.
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
