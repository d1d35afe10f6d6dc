//! Async session drivers
//!
//! Bind the sans-I/O state machines to a [`DatagramTransport`]. The sender
//! waits for each ACK with a bounded receive and distinguishes three
//! outcomes: timed out (retransmit), frame rejected (retransmit), frame
//! accepted (advance).

use std::collections::VecDeque;
use std::net::SocketAddr;

use tokio::time::{self, Instant};

use super::receiver::{ReceiveOutcome, Receiver};
use super::sender::{AckOutcome, Sender};
use crate::config::{ReceiverConfig, SenderConfig};
use crate::core::DatagramTransport;
use crate::transport::{TransportError, TransportResult};

/// What it took to get one unit acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SendReport {
    /// Total retransmissions of the unit.
    pub retransmissions: u32,
    /// Retransmissions caused by the ACK timer.
    pub timeouts: u32,
    /// Retransmissions caused by a corrupt or wrong-sequence ACK.
    pub rejected_acks: u32,
}

/// Sending endpoint of a session.
#[derive(Debug)]
pub struct RdtSender<T> {
    machine: Sender,
    transport: T,
    peer: SocketAddr,
    config: SenderConfig,
}

impl<T: DatagramTransport> RdtSender<T> {
    /// Create a sender that talks to `peer` over `transport`.
    pub fn new(transport: T, peer: SocketAddr, config: SenderConfig) -> Self {
        Self {
            machine: Sender::new(),
            transport,
            peer,
            config,
        }
    }

    /// Deliver one unit reliably, returning once it is acknowledged.
    ///
    /// Retransmits on timeout and on bad ACKs until the configured limit is
    /// reached. Transport failures are returned immediately. After any error
    /// the session is unusable.
    pub async fn send_unit(&mut self, unit: &[u8]) -> TransportResult<SendReport> {
        let Some(frame) = self.machine.send(unit)? else {
            // Previous unit was never acknowledged: the session already failed.
            return Err(TransportError::ConnectionClosed);
        };
        tracing::trace!(peer = %self.peer, len = frame.len(), "tx data");
        self.transport
            .send_to(frame, self.peer)
            .await
            .map_err(TransportError::from_io)?;

        let mut report = SendReport::default();
        // Only a (re)transmission restarts the ACK timer.
        let mut deadline = Instant::now() + self.config.timeout;
        loop {
            match time::timeout_at(deadline, self.transport.recv_from()).await {
                Err(_) => {
                    report.timeouts += 1;
                    self.machine.on_timeout();
                }
                Ok(Err(err)) => {
                    let err = TransportError::from_io(err);
                    tracing::warn!(error = %err, "transport failed while waiting for ACK");
                    return Err(err);
                }
                Ok(Ok((frame, from))) => {
                    if from != self.peer {
                        tracing::trace!(%from, "ignoring datagram from unknown peer");
                        continue;
                    }
                    tracing::trace!(len = frame.len(), "rx ack");
                    match self.machine.on_receive(&frame) {
                        AckOutcome::Acknowledged => {
                            report.retransmissions = report.timeouts + report.rejected_acks;
                            return Ok(report);
                        }
                        AckOutcome::Retransmit(_) => report.rejected_acks += 1,
                        AckOutcome::Ignored => continue,
                    }
                }
            }
            self.retransmit().await?;
            deadline = Instant::now() + self.config.timeout;
        }
    }

    /// Resend the frame in flight, enforcing the give-up policy.
    async fn retransmit(&mut self) -> TransportResult<()> {
        if let Some(max) = self.config.max_retransmits {
            if self.machine.retransmits() > max {
                tracing::warn!(attempts = max, peer = %self.peer, "giving up on unit");
                return Err(TransportError::MaxRetransmitsExceeded { attempts: max });
            }
        }
        let Some(frame) = self.machine.in_flight() else {
            return Ok(());
        };
        tracing::trace!(peer = %self.peer, "tx data (retransmit)");
        self.transport
            .send_to(frame, self.peer)
            .await
            .map_err(TransportError::from_io)
    }

    /// The state machine.
    pub fn machine(&self) -> &Sender {
        &self.machine
    }

    /// Borrow the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Address units are sent to.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Unwrap the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }
}

/// Receiving endpoint of a session.
///
/// ACKs go back to whoever sent the frame being answered; the address is
/// tracked per instance, so independent receivers never share it.
#[derive(Debug)]
pub struct RdtReceiver<T> {
    machine: Receiver,
    transport: T,
    config: ReceiverConfig,
    last_peer: Option<SocketAddr>,
    /// Units that arrived while lingering
    pending: VecDeque<Vec<u8>>,
}

impl<T: DatagramTransport> RdtReceiver<T> {
    /// Create a receiver on `transport`.
    pub fn new(transport: T, config: ReceiverConfig) -> Self {
        Self {
            machine: Receiver::new(),
            transport,
            config,
            last_peer: None,
            pending: VecDeque::new(),
        }
    }

    /// Block until the next in-order unit is delivered.
    pub async fn recv_unit(&mut self) -> TransportResult<Vec<u8>> {
        if let Some(unit) = self.pending.pop_front() {
            return Ok(unit);
        }
        loop {
            if let Some(payload) = self.handle_next().await? {
                return Ok(payload);
            }
        }
    }

    /// Keep answering retransmissions until the channel is quiet for the
    /// linger period or the peer goes away.
    ///
    /// Covers a lost final ACK: without it the sender would retransmit its
    /// last unit to nobody. Returns how many frames were answered.
    pub async fn linger(&mut self) -> TransportResult<u64> {
        let mut answered = 0;
        loop {
            match time::timeout(self.config.linger, self.handle_next()).await {
                Err(_) => break,
                Ok(Err(TransportError::ConnectionClosed)) => break,
                Ok(Err(err)) => return Err(err),
                Ok(Ok(Some(unit))) => {
                    tracing::debug!(len = unit.len(), "unit arrived while lingering");
                    self.pending.push_back(unit);
                }
                Ok(Ok(None)) => answered += 1,
            }
        }
        tracing::debug!(answered, "linger finished");
        Ok(answered)
    }

    /// Receive one frame, answer it, and return the payload if delivered.
    async fn handle_next(&mut self) -> TransportResult<Option<Vec<u8>>> {
        let (frame, from) = self
            .transport
            .recv_from()
            .await
            .map_err(TransportError::from_io)?;
        tracing::trace!(%from, len = frame.len(), "rx frame");
        self.last_peer = Some(from);

        let outcome = self.machine.receive(&frame);
        if let Some(ack) = outcome.ack() {
            tracing::trace!(%from, "tx ack");
            self.transport
                .send_to(ack, from)
                .await
                .map_err(TransportError::from_io)?;
        }

        Ok(match outcome {
            ReceiveOutcome::Delivered { payload, .. } => Some(payload),
            ReceiveOutcome::Rejected { .. } => None,
        })
    }

    /// The state machine.
    pub fn machine(&self) -> &Receiver {
        &self.machine
    }

    /// Address of the most recent sender.
    pub fn last_peer(&self) -> Option<SocketAddr> {
        self.last_peer
    }

    /// Borrow the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Unwrap the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }
}
