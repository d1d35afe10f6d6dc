//! RDT Protocol - Transport Layer
//!
//! Everything between the state machines and the wire:
//!
//! - **Checksum**: [`checksum::fold`] / [`checksum::verify`], the 16-bit XOR fold
//! - **Frame codec**: [`DataPacket`], [`AckPacket`], [`Frame`] and the raw-byte predicates
//! - **Sockets**: [`RdtSocket`] wrapper for tokio UDP (requires `transport`)
//! - **Memory link**: [`MemoryLink`] in-process endpoint pair (requires `transport`)
//! - **Simulator**: [`ChannelSimulator`] fault injector (requires `simulator`)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │     Sender / Receiver state machines    │
//! ├─────────────────────────────────────────┤
//! │         Frame codec + checksum          │  ← This module
//! ├─────────────────────────────────────────┤
//! │     Channel simulator (optional)        │
//! ├─────────────────────────────────────────┤
//! │        UDP socket / memory link         │
//! └─────────────────────────────────────────┘
//! ```

pub mod checksum;
mod error;
mod frame;

#[cfg(feature = "transport")]
mod memory;
#[cfg(feature = "simulator")]
mod simulator;
#[cfg(feature = "transport")]
mod socket;

pub use error::*;
pub use frame::*;

#[cfg(feature = "transport")]
pub use memory::*;
#[cfg(feature = "simulator")]
pub use simulator::*;
#[cfg(feature = "transport")]
pub use socket::*;
