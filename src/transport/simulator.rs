//! Fault-injecting channel simulator.
//!
//! [`ChannelSimulator`] wraps any [`DatagramTransport`] and applies the
//! configured [`Scenario`] to incoming frames:
//!
//! | Scenario       | Hits          | Fault                 |
//! |----------------|---------------|-----------------------|
//! | `NoLoss`       | nothing       | -                     |
//! | `TxAckLoss`    | incoming ACK  | single-bit corruption |
//! | `RxDataLoss`   | incoming DATA | single-bit corruption |
//! | `TxAckDrop`    | incoming ACK  | silent drop           |
//! | `RxDataDrop`   | incoming DATA | silent drop           |
//!
//! Both endpoints can run the same scenario; each only touches frames
//! travelling in the targeted direction. Corruption flips one bit in the
//! frame body, never in the header or the checksum, so the result always
//! fails verification and can never pass as a valid frame.

use std::io;
use std::net::SocketAddr;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::frame::{FrameKind, is_ack};
use crate::config::{Fault, SimulatorConfig};
use crate::core::DatagramTransport;
use crate::core::constants::{CHECKSUM_SIZE, DATA_HEADER_SIZE};

/// Counters of frames seen by one simulator.
///
/// Received counts include frames that were subsequently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelStats {
    /// DATA frames sent through this endpoint.
    pub data_sent: u64,
    /// ACK frames sent through this endpoint.
    pub acks_sent: u64,
    /// DATA frames that arrived at this endpoint.
    pub data_received: u64,
    /// ACK frames that arrived at this endpoint.
    pub acks_received: u64,
    /// Frames corrupted on arrival.
    pub corrupted: u64,
    /// Frames dropped on arrival.
    pub dropped: u64,
}

impl ChannelStats {
    /// Total faults injected.
    pub fn faults(&self) -> u64 {
        self.corrupted + self.dropped
    }

    fn record(&mut self, kind: FrameKind, sent: bool) {
        match (kind, sent) {
            (FrameKind::Data, true) => self.data_sent += 1,
            (FrameKind::Ack, true) => self.acks_sent += 1,
            (FrameKind::Data, false) => self.data_received += 1,
            (FrameKind::Ack, false) => self.acks_received += 1,
        }
    }
}

/// A fault-injecting wrapper around a datagram transport.
#[derive(Debug)]
pub struct ChannelSimulator<T> {
    inner: T,
    config: SimulatorConfig,
    rng: ChaCha8Rng,
    stats: ChannelStats,
}

impl<T> ChannelSimulator<T> {
    /// Wrap `inner` with the given fault model.
    pub fn new(inner: T, config: SimulatorConfig) -> Self {
        let rng = config
            .seed
            .map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
        Self {
            inner,
            config,
            rng,
            stats: ChannelStats::default(),
        }
    }

    /// Wrap `inner` as a transparent pass-through.
    pub fn passthrough(inner: T) -> Self {
        Self::new(inner, SimulatorConfig::default())
    }

    /// Counters so far.
    pub fn stats(&self) -> ChannelStats {
        self.stats
    }

    /// Active configuration.
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Borrow the wrapped transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Unwrap the transport.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Decide whether the next frame of `kind` is hit.
    fn draw_fault(&mut self, kind: FrameKind) -> Option<Fault> {
        let fault = self.config.scenario.fault_for(kind)?;
        if self
            .config
            .max_faults
            .is_some_and(|max| self.stats.faults() >= max)
        {
            return None;
        }
        let p = self.config.loss.get();
        (p > 0.0 && self.rng.gen_bool(p)).then_some(fault)
    }
}

impl<T: DatagramTransport> DatagramTransport for ChannelSimulator<T> {
    async fn send_to(&mut self, frame: &[u8], peer: SocketAddr) -> io::Result<()> {
        self.stats.record(FrameKind::of(frame), true);
        self.inner.send_to(frame, peer).await
    }

    async fn recv_from(&mut self) -> io::Result<(Vec<u8>, SocketAddr)> {
        loop {
            let (mut frame, addr) = self.inner.recv_from().await?;
            let kind = FrameKind::of(&frame);
            self.stats.record(kind, false);

            match self.draw_fault(kind) {
                Some(Fault::Drop) => {
                    self.stats.dropped += 1;
                    tracing::debug!(%kind, %addr, "simulator: dropped frame");
                }
                Some(Fault::Corrupt) => {
                    if let Some((byte, bit)) = corrupt_frame(&mut frame, &mut self.rng) {
                        self.stats.corrupted += 1;
                        tracing::debug!(%kind, %addr, byte, bit, "simulator: corrupted frame");
                    }
                    return Ok((frame, addr));
                }
                None => return Ok((frame, addr)),
            }
        }
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }
}

/// Flip one random bit in the body of `frame`.
///
/// For data frames the body is everything between the 2-byte header and the
/// 2-byte checksum; for ACKs it is the marker byte. Returns the byte index
/// and bit flipped, or `None` for an empty frame.
pub fn corrupt_frame<R: Rng + ?Sized>(frame: &mut [u8], rng: &mut R) -> Option<(usize, u8)> {
    let body = if is_ack(frame) {
        1..2
    } else if frame.len() > DATA_HEADER_SIZE + CHECKSUM_SIZE {
        DATA_HEADER_SIZE..frame.len() - CHECKSUM_SIZE
    } else {
        0..frame.len()
    };
    if body.is_empty() {
        return None;
    }

    let byte = rng.gen_range(body);
    let bit = rng.gen_range(0..8u8);
    frame[byte] ^= 1 << bit;
    Some((byte, bit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LossProbability, Scenario};
    use crate::core::constants::FULL_SIZE;
    use crate::transport::frame::{SeqNum, encode_ack, encode_data, is_corrupt};
    use crate::transport::memory::MemoryLink;

    #[test]
    fn test_corrupt_frame_avoids_header_and_checksum() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let clean = encode_data(b"hello", SeqNum::One).unwrap();

        for _ in 0..200 {
            let mut frame = clean.clone();
            let (byte, _) = corrupt_frame(&mut frame, &mut rng).unwrap();
            assert!((DATA_HEADER_SIZE..FULL_SIZE - CHECKSUM_SIZE).contains(&byte));
            assert_eq!(frame[..2], clean[..2]);
            assert_eq!(frame[FULL_SIZE - 2..], clean[FULL_SIZE - 2..]);
            assert!(is_corrupt(&frame));
        }
    }

    #[test]
    fn test_corrupt_ack_hits_marker() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut ack = encode_ack(SeqNum::Zero);
        let (byte, _) = corrupt_frame(&mut ack, &mut rng).unwrap();
        assert_eq!(byte, 1);
        assert!(is_corrupt(&ack));
    }

    #[test]
    fn test_corrupt_empty_frame() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(corrupt_frame(&mut [], &mut rng), None);
    }

    #[tokio::test]
    async fn test_passthrough_counts_frames() {
        let (a, b) = MemoryLink::loopback();
        let to_b = b.local_addr().unwrap();
        let mut a = ChannelSimulator::passthrough(a);
        let mut b = ChannelSimulator::passthrough(b);

        a.send_to(&encode_data(b"x", SeqNum::Zero).unwrap(), to_b).await.unwrap();
        let (frame, _) = b.recv_from().await.unwrap();
        assert!(!is_corrupt(&frame));

        assert_eq!(a.stats().data_sent, 1);
        assert_eq!(b.stats().data_received, 1);
        assert_eq!(b.stats().faults(), 0);
    }

    #[tokio::test]
    async fn test_data_corruption_scenario() {
        let (a, b) = MemoryLink::loopback();
        let to_b = b.local_addr().unwrap();
        let mut a = ChannelSimulator::passthrough(a);
        let config = SimulatorConfig::new(Scenario::RxDataLoss, LossProbability::ALWAYS).with_seed(3);
        let mut b = ChannelSimulator::new(b, config);

        a.send_to(&encode_ack(SeqNum::Zero), to_b).await.unwrap();
        a.send_to(&encode_data(b"x", SeqNum::Zero).unwrap(), to_b).await.unwrap();

        // ACKs are not targeted by this scenario.
        let (ack, _) = b.recv_from().await.unwrap();
        assert!(!is_corrupt(&ack));
        let (data, _) = b.recv_from().await.unwrap();
        assert!(is_corrupt(&data));
        assert_eq!(b.stats().corrupted, 1);
    }

    #[tokio::test]
    async fn test_drop_respects_fault_budget() {
        let (a, b) = MemoryLink::loopback();
        let to_b = b.local_addr().unwrap();
        let mut a = ChannelSimulator::passthrough(a);
        let config = SimulatorConfig::new(Scenario::TxAckDrop, LossProbability::ALWAYS)
            .with_seed(9)
            .with_max_faults(2);
        let mut b = ChannelSimulator::new(b, config);

        a.send_to(&encode_ack(SeqNum::Zero), to_b).await.unwrap();
        a.send_to(&encode_ack(SeqNum::One), to_b).await.unwrap();
        a.send_to(&encode_ack(SeqNum::Zero), to_b).await.unwrap();

        // First two are eaten, the third gets through.
        let (frame, _) = b.recv_from().await.unwrap();
        assert_eq!(frame, encode_ack(SeqNum::Zero));
        assert_eq!(b.stats().dropped, 2);
        assert_eq!(b.stats().acks_received, 3);
    }

    #[tokio::test]
    async fn test_seeded_runs_are_reproducible() {
        async fn run(seed: u64) -> Vec<bool> {
            let (a, b) = MemoryLink::loopback();
            let to_b = b.local_addr().unwrap();
            let mut a = ChannelSimulator::passthrough(a);
            let loss = LossProbability::new(50.0).unwrap();
            let config = SimulatorConfig::new(Scenario::RxDataLoss, loss).with_seed(seed);
            let mut b = ChannelSimulator::new(b, config);

            let frame = encode_data(b"repeat", SeqNum::One).unwrap();
            let mut hits = Vec::new();
            for _ in 0..32 {
                a.send_to(&frame, to_b).await.unwrap();
                let (got, _) = b.recv_from().await.unwrap();
                hits.push(is_corrupt(&got));
            }
            hits
        }

        assert_eq!(run(42).await, run(42).await);
    }
}
