//! Internal telemetry for the attribution engine.
//!
//! In-process counters and tracing setup; no external metrics systems.
//! The run summary and a metrics snapshot are logged at the end of each
//! batch run.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::*;
pub use tracing_setup::*;
