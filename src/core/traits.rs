//! Core traits for the RDT protocol.
//!
//! These traits define the seam between the protocol and the unreliable
//! channel it runs over.

use std::io;
use std::net::SocketAddr;

/// An unreliable, message-oriented channel.
///
/// Implementations may lose, corrupt, or reorder datagrams; the protocol
/// layer recovers from all of that. They MUST preserve datagram boundaries.
///
/// # Requirements
///
/// - `send_to` transmits one datagram and does not retry
/// - `recv_from` blocks until one datagram arrives, returning its source
/// - a closed or unreachable channel is reported as an `io::Error`
///
/// Receive timeouts are applied by the caller, so `recv_from` itself never
/// times out.
///
/// # Example
///
/// ```ignore
/// struct Loopback { queue: VecDeque<(Vec<u8>, SocketAddr)>, addr: SocketAddr }
///
/// impl DatagramTransport for Loopback {
///     async fn send_to(&mut self, frame: &[u8], _peer: SocketAddr) -> io::Result<()> {
///         self.queue.push_back((frame.to_vec(), self.addr));
///         Ok(())
///     }
///
///     async fn recv_from(&mut self) -> io::Result<(Vec<u8>, SocketAddr)> {
///         self.queue.pop_front().ok_or_else(|| io::ErrorKind::UnexpectedEof.into())
///     }
///
///     fn local_addr(&self) -> io::Result<SocketAddr> {
///         Ok(self.addr)
///     }
/// }
/// ```
#[allow(async_fn_in_trait)]
pub trait DatagramTransport {
    /// Send one datagram to `peer`.
    async fn send_to(&mut self, frame: &[u8], peer: SocketAddr) -> io::Result<()>;

    /// Receive the next datagram and the address it came from.
    async fn recv_from(&mut self) -> io::Result<(Vec<u8>, SocketAddr)>;

    /// Address this endpoint is reachable at.
    fn local_addr(&self) -> io::Result<SocketAddr>;
}
