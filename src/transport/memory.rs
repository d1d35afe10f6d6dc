//! In-process datagram link.
//!
//! [`MemoryLink::pair`] returns two connected endpoints backed by tokio
//! channels. Delivery is perfect and ordered; wrap an endpoint in a
//! channel simulator to make it lossy. Dropping one endpoint closes the
//! link, which the other side observes as a fatal I/O condition.

use std::io;
use std::net::SocketAddr;

use tokio::sync::mpsc;

use crate::core::DatagramTransport;

/// Factory for connected in-memory endpoints.
#[derive(Debug)]
pub struct MemoryLink;

impl MemoryLink {
    /// Create two endpoints addressed as `a` and `b`.
    pub fn pair(a: SocketAddr, b: SocketAddr) -> (MemoryEndpoint, MemoryEndpoint) {
        let (tx_a, rx_b) = mpsc::unbounded_channel();
        let (tx_b, rx_a) = mpsc::unbounded_channel();

        let left = MemoryEndpoint {
            local: a,
            peer: b,
            tx: tx_a,
            rx: rx_a,
        };
        let right = MemoryEndpoint {
            local: b,
            peer: a,
            tx: tx_b,
            rx: rx_b,
        };
        (left, right)
    }

    /// Create two endpoints on fixed loopback addresses.
    pub fn loopback() -> (MemoryEndpoint, MemoryEndpoint) {
        Self::pair(
            SocketAddr::from(([127, 0, 0, 1], 50000)),
            SocketAddr::from(([127, 0, 0, 1], 50001)),
        )
    }
}

/// One side of a [`MemoryLink`].
#[derive(Debug)]
pub struct MemoryEndpoint {
    local: SocketAddr,
    peer: SocketAddr,
    tx: mpsc::UnboundedSender<Vec<u8>>,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl MemoryEndpoint {
    /// Address of the other endpoint.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl DatagramTransport for MemoryEndpoint {
    async fn send_to(&mut self, frame: &[u8], peer: SocketAddr) -> io::Result<()> {
        if peer != self.peer {
            // Nobody listens there; like UDP, the datagram just vanishes.
            tracing::trace!(%peer, "memory link: no route, dropping datagram");
            return Ok(());
        }
        self.tx
            .send(frame.to_vec())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "memory link closed"))
    }

    async fn recv_from(&mut self) -> io::Result<(Vec<u8>, SocketAddr)> {
        match self.rx.recv().await {
            Some(frame) => Ok((frame, self.peer)),
            None => Err(io::Error::new(
                io::ErrorKind::ConnectionAborted,
                "memory link closed",
            )),
        }
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        Ok(self.local)
    }
}
