//! Telemetry initialization
//!
//! Installs the global `tracing` subscriber used by Strata hosts and tests.

mod init_basic;

pub use init_basic::{init_telemetry, DEFAULT_LOG_FILTER};
