//! Strata Core Library
//!
//! This crate provides the configuration, constants and backend selection types
//! shared by the Strata storage components.

pub mod config;
pub mod constants;
pub mod storage_types;

// Re-export commonly used types
pub use config::StorageConfig;
pub use storage_types::StorageBackend;
