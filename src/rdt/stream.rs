//! Byte-stream transfer on top of the unit sessions.
//!
//! A stream is a header unit carrying the unit count (u64, little endian)
//! followed by that many units of at most [`DATA_SIZE`] bytes. The last unit
//! is always the tail of the input, possibly empty.

use std::time::{Duration, Instant};

use super::session::{RdtReceiver, RdtSender};
use crate::core::constants::{DATA_SIZE, STREAM_HEADER_SIZE};
use crate::core::{DatagramTransport, StreamError};

/// Summary of one stream transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamReport {
    /// Data units sent, header excluded.
    pub units: u64,
    /// Payload bytes sent.
    pub bytes: u64,
    /// Retransmissions over the whole transfer, header included.
    pub retransmissions: u64,
    /// Wall time from the first transmission to the last ACK.
    pub elapsed: Duration,
}

/// Split `data` into units of [`DATA_SIZE`] bytes plus a final tail unit.
///
/// Input that is an exact multiple of the unit size gets an empty tail.
pub fn chunk_units(data: &[u8]) -> Vec<&[u8]> {
    let chunks = data.chunks_exact(DATA_SIZE);
    let tail = chunks.remainder();
    chunks.chain(std::iter::once(tail)).collect()
}

/// Send `data` as a stream.
pub async fn send_stream<T: DatagramTransport>(
    sender: &mut RdtSender<T>,
    data: &[u8],
) -> Result<StreamReport, StreamError> {
    let units = chunk_units(data);
    let count = units.len() as u64;
    tracing::info!(peer = %sender.peer(), bytes = data.len(), units = count, "stream started");

    let start = Instant::now();
    let mut retransmissions = u64::from(sender.send_unit(&count.to_le_bytes()).await?.retransmissions);
    for unit in units {
        let report = sender.send_unit(unit).await?;
        retransmissions += u64::from(report.retransmissions);
    }

    let report = StreamReport {
        units: count,
        bytes: data.len() as u64,
        retransmissions,
        elapsed: start.elapsed(),
    };
    tracing::info!(
        units = report.units,
        retransmissions = report.retransmissions,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "stream sent"
    );
    Ok(report)
}

/// Receive one stream and reassemble it.
pub async fn recv_stream<T: DatagramTransport>(
    receiver: &mut RdtReceiver<T>,
) -> Result<Vec<u8>, StreamError> {
    let header = receiver.recv_unit().await?;
    let count: [u8; STREAM_HEADER_SIZE] =
        header
            .as_slice()
            .try_into()
            .map_err(|_| StreamError::MalformedHeader {
                expected: STREAM_HEADER_SIZE,
                actual: header.len(),
            })?;
    let count = u64::from_le_bytes(count);
    tracing::info!(units = count, "stream incoming");

    let mut data = Vec::new();
    for _ in 0..count {
        data.extend_from_slice(&receiver.recv_unit().await?);
    }

    tracing::info!(bytes = data.len(), "stream received");
    Ok(data)
}
