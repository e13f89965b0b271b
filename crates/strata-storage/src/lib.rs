//! Strata Storage Library
//!
//! This crate emulates a hierarchical, tenant-scoped filesystem on top of a
//! flat object store. Callers work with paths through the `FileStorage` trait;
//! `ObjectStorage` translates every call into operations of an `ObjectClient`.
//!
//! # Storage key format
//!
//! - **No tenant**: `/{path}`
//! - **Tenant**: `/{tenant_id}/{path}`
//!
//! A key ending in `/` is a zero-length directory marker. A directory exists
//! iff its marker exists. Key generation is centralized in the `keys` module.

pub mod attributes;
pub mod batch;
pub mod client;
pub mod deletion;
pub mod directories;
pub mod factory;
pub mod keys;
pub mod listing;
#[cfg(feature = "storage-memory")]
pub mod memory;
pub mod moves;
pub mod object_storage;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use attributes::{FileAttributes, FileType};
pub use batch::{BatchOperation, ObjectBatch, PendingResult};
pub use client::{ListOptions, ObjectClient, ObjectDescriptor, ObjectStream};
pub use factory::{create_object_client, create_storage};
#[cfg(feature = "storage-memory")]
pub use memory::InMemoryObjectClient;
pub use object_storage::ObjectStorage;
#[cfg(feature = "storage-s3")]
pub use s3::{ObjectStoreClient, S3ObjectClient};
pub use strata_core::{StorageBackend, StorageConfig};
pub use traits::{FileStorage, StorageError, StorageResult};
