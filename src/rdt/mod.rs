//! Alternating-bit reliable data transfer.
//!
//! [`Sender`] and [`Receiver`] are pure state machines: feed them units,
//! frames and timer expiries, and they return the bytes to transmit. The
//! async drivers ([`RdtSender`], [`RdtReceiver`]) bind them to a
//! [`DatagramTransport`](crate::core::DatagramTransport), and the stream
//! functions move whole byte buffers on top of those.

mod receiver;
mod sender;

#[cfg(feature = "transport")]
mod session;
#[cfg(feature = "transport")]
mod stream;

pub use receiver::*;
pub use sender::*;

#[cfg(feature = "transport")]
pub use session::*;
#[cfg(feature = "transport")]
pub use stream::*;
