//! Strata Infrastructure Library
//!
//! Shared infrastructure used by hosts embedding Strata storage:
//! - Telemetry initialization (structured `tracing` output)

#[cfg(feature = "observability-basic")]
pub mod telemetry;

#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, DEFAULT_LOG_FILTER};
