//! Core types, policy, and key derivation for the attribution engine.

pub mod error;
pub mod events;
pub mod ids;
pub mod policy;
pub mod records;
pub mod traffic;

pub use error::{Error, Result};
pub use events::*;
pub use records::*;
pub use traffic::{Channel, TrafficSource};
