//! Core types for the RDT protocol.
//!
//! Contains constants, error types, and the transport trait. Always compiled.

pub mod constants;
mod error;
mod traits;

pub use constants::*;
pub use error::*;
pub use traits::*;
