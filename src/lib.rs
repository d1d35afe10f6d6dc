//! # RDT Protocol
//!
//! Alternating-bit **R**eliable **D**ata **T**ransfer (RDT 2.2) over an
//! unreliable datagram channel.
//!
//! Two endpoints move a sequence of units in order, exactly once, across a
//! channel that may flip bits in transit. Every frame carries a 16-bit XOR
//! fold checksum and a one-bit sequence number; the sender keeps one frame
//! in flight and retransmits it on a timeout or a bad ACK, and the receiver
//! answers duplicates by repeating its last ACK instead of delivering twice.
//!
//! ## Feature Flags
//!
//! - `transport` (default): tokio UDP socket, in-memory link, async session drivers, streams
//! - `simulator` (default): seeded fault-injecting channel simulator
//! - `cli` (default): the `rdt-send` / `rdt-recv` binaries
//!
//! ## Modules
//!
//! - [`core`]: constants, error types and the datagram transport trait (always included)
//! - [`transport`]: checksum and frame codec (always), sockets and simulator (feature-gated)
//! - [`rdt`]: sender and receiver state machines, session drivers
//! - [`config`]: sender, receiver and simulator configuration
//!
//! ## Example Usage
//!
//! The state machines do no I/O and can be driven by hand:
//!
//! ```rust
//! use rdt_protocol::prelude::*;
//!
//! let mut sender = Sender::new();
//! let mut receiver = Receiver::new();
//!
//! let frame = sender.send(b"AB").unwrap().unwrap().to_vec();
//! let outcome = receiver.receive(&frame);
//! assert_eq!(outcome.payload(), Some(&b"AB"[..]));
//!
//! let ack = outcome.ack().unwrap();
//! assert_eq!(sender.on_receive(ack), AckOutcome::Acknowledged);
//! assert_eq!(sender.state(), SenderState::WaitCall1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

// Configuration
pub mod config;

// Wire format, sockets and simulator
pub mod transport;

// State machines and session drivers
pub mod rdt;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::*;
    pub use crate::core::*;
    pub use crate::rdt::*;
    pub use crate::transport::{
        AckPacket, DataPacket, Frame, FrameError, FrameKind, PacketError, SeqNum,
        TransportError, TransportResult,
    };

    #[cfg(feature = "transport")]
    pub use crate::transport::{MemoryEndpoint, MemoryLink, RdtSocket, RdtSocketBuilder};

    #[cfg(feature = "simulator")]
    pub use crate::transport::{ChannelSimulator, ChannelStats};
}

// Re-export commonly used items at crate root
pub use core::{DatagramTransport, RdtError};
pub use rdt::{Receiver, Sender};
pub use transport::{SeqNum, TransportError};

#[cfg(feature = "transport")]
pub use rdt::{RdtReceiver, RdtSender, recv_stream, send_stream};
