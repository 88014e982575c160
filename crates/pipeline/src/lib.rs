//! Batch pipeline stages for the attribution engine.
//!
//! A full run flows strictly forward:
//! 1. Normalizer (accepted events → normalized records)
//! 2. Identity Stitcher (device → person map)
//! 3. Sessionizer ∥ Order Line Expander (independent stages)
//! 4. Attribution Engine (waits on the Sessionizer)
//!
//! The runner orchestrates the phases and writes all four tables
//! atomically as a unit.

pub mod attribution;
pub mod identity;
pub mod normalizer;
pub mod order_lines;
pub mod purchases;
pub mod runner;
pub mod sessionizer;
pub mod summary;

pub use attribution::attribute;
pub use identity::IdentityMap;
pub use normalizer::Normalizer;
pub use order_lines::{expand_order_lines, ExpansionStats};
pub use purchases::{collect_purchases, Purchase};
pub use runner::{run, EngineConfig, RunOutcome};
pub use sessionizer::build_sessions;
pub use summary::RunSummary;
