//! Async UDP socket wrapper for RDT transport.
//!
//! Provides a [`DatagramTransport`] over a tokio `UdpSocket` with proper
//! buffer management.

use std::io;
use std::net::SocketAddr;

use tokio::net::UdpSocket;

use crate::core::DatagramTransport;
use crate::core::constants::FULL_SIZE;

/// Default receive buffer size.
///
/// Larger than [`FULL_SIZE`] so an oversized datagram arrives whole and
/// fails verification instead of being silently truncated into shape.
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 2 * FULL_SIZE;

/// Async UDP socket wrapper for RDT.
#[derive(Debug)]
pub struct RdtSocket {
    /// The underlying UDP socket.
    socket: UdpSocket,
    /// Receive buffer.
    recv_buffer: Vec<u8>,
}

impl RdtSocket {
    /// Create a new socket bound to the given address.
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        RdtSocketBuilder::new().bind(addr).await
    }

    /// Create a socket from an existing UDP socket.
    pub fn from_socket(socket: UdpSocket) -> Self {
        RdtSocketBuilder::new().from_socket(socket)
    }

    /// Get the local address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Size of the receive buffer.
    pub fn recv_buffer_size(&self) -> usize {
        self.recv_buffer.len()
    }
}

impl DatagramTransport for RdtSocket {
    async fn send_to(&mut self, frame: &[u8], peer: SocketAddr) -> io::Result<()> {
        self.socket.send_to(frame, peer).await?;
        Ok(())
    }

    async fn recv_from(&mut self) -> io::Result<(Vec<u8>, SocketAddr)> {
        let (len, addr) = self.socket.recv_from(&mut self.recv_buffer).await?;
        Ok((self.recv_buffer[..len].to_vec(), addr))
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

/// Builder for creating RDT sockets with custom options.
#[derive(Debug, Clone)]
pub struct RdtSocketBuilder {
    recv_buffer_size: usize,
}

impl Default for RdtSocketBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RdtSocketBuilder {
    /// Create a new socket builder with default options.
    pub fn new() -> Self {
        Self {
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
        }
    }

    /// Set the receive buffer size.
    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = size;
        self
    }

    /// Bind to the given address and create a socket.
    pub async fn bind(self, addr: SocketAddr) -> io::Result<RdtSocket> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(self.from_socket(socket))
    }

    /// Create a socket from an existing UDP socket.
    pub fn from_socket(self, socket: UdpSocket) -> RdtSocket {
        RdtSocket {
            socket,
            recv_buffer: vec![0u8; self.recv_buffer_size],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_socket_bind() {
        let socket = RdtSocket::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let addr = socket.local_addr().unwrap();
        assert!(addr.port() != 0);
    }

    #[tokio::test]
    async fn test_socket_send_recv() {
        let mut server = RdtSocket::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let server_addr = server.local_addr().unwrap();

        let mut client = RdtSocket::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();

        let data = b"hello RDT";
        client.send_to(data, server_addr).await.unwrap();

        let (received, from) = server.recv_from().await.unwrap();
        assert_eq!(received, data);
        assert_eq!(from, client.local_addr().unwrap());
    }

    #[tokio::test]
    async fn test_full_frame_fits_default_buffer() {
        let mut server = RdtSocket::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let server_addr = server.local_addr().unwrap();
        let mut client = RdtSocket::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();

        let frame = vec![0x5Au8; FULL_SIZE];
        client.send_to(&frame, server_addr).await.unwrap();

        let (received, _) = server.recv_from().await.unwrap();
        assert_eq!(received.len(), FULL_SIZE);
    }

    #[test]
    fn test_socket_builder() {
        let builder = RdtSocketBuilder::new().recv_buffer_size(4096);
        assert_eq!(builder.recv_buffer_size, 4096);
    }
}
