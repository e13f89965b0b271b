//! Storage abstraction trait
//!
//! This module defines the `FileStorage` trait exposed to callers and the error
//! type shared by every storage component.

use crate::attributes::FileAttributes;
use async_trait::async_trait;
use bytes::Bytes;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error(
        "Unable to apply all batch operations, failed on [{}]{}",
        .failed.join(", "),
        .cause.as_ref().map(|c| format!(" ({})", c)).unwrap_or_default()
    )]
    PartialBatchFailure {
        failed: Vec<String>,
        /// Store error that interrupted the batch, if any.
        cause: Option<String>,
    },

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Hierarchical, tenant-scoped file storage
///
/// Paths are URIs of the form `scheme:///a/b` or plain `/a/b`. Every returned
/// locator is a `scheme:///...` URI relative to the tenant. A `None` tenant
/// addresses the shared, unprefixed namespace.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Read a whole file. Fails with `NotFound` when nothing is stored at the path.
    async fn get(&self, tenant_id: Option<&str>, uri: &str) -> StorageResult<Bytes>;

    /// Every object below `prefix`, recursively, as caller-visible URIs.
    async fn all_by_prefix(
        &self,
        tenant_id: Option<&str>,
        prefix: &str,
        include_directories: bool,
    ) -> StorageResult<Vec<String>>;

    /// Immediate children of a directory.
    ///
    /// An existing empty directory lists as an empty vector; a path that does
    /// not exist at all fails with `NotFound`.
    async fn list(&self, tenant_id: Option<&str>, uri: &str) -> StorageResult<Vec<FileAttributes>>;

    /// Whether a file or a directory marker exists at the path.
    async fn exists(&self, tenant_id: Option<&str>, uri: &str) -> StorageResult<bool>;

    /// Size in bytes (0 for directories).
    async fn size(&self, tenant_id: Option<&str>, uri: &str) -> StorageResult<u64>;

    /// Last modification time in epoch milliseconds, 0 when the store does not report one.
    async fn last_modified_time(&self, tenant_id: Option<&str>, uri: &str) -> StorageResult<i64>;

    async fn get_attributes(
        &self,
        tenant_id: Option<&str>,
        uri: &str,
    ) -> StorageResult<FileAttributes>;

    /// Write a file, creating markers for every missing ancestor directory.
    async fn put(&self, tenant_id: Option<&str>, uri: &str, data: Bytes) -> StorageResult<String>;

    /// Write a file from a reader. The reader is consumed until EOF.
    async fn put_stream(
        &self,
        tenant_id: Option<&str>,
        uri: &str,
        reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<String>;

    /// Delete a file, or a directory with everything below it.
    ///
    /// Returns `false` when nothing existed at the path.
    async fn delete(&self, tenant_id: Option<&str>, uri: &str) -> StorageResult<bool>;

    /// Create a directory and all of its ancestors.
    async fn create_directory(&self, tenant_id: Option<&str>, uri: &str) -> StorageResult<String>;

    /// Move a file or a directory tree. Not atomic: a failure can leave a partial move.
    async fn move_path(&self, tenant_id: Option<&str>, from: &str, to: &str)
        -> StorageResult<String>;

    /// Delete every object under a prefix in one batch and return the deleted URIs.
    async fn delete_by_prefix(
        &self,
        tenant_id: Option<&str>,
        prefix: &str,
    ) -> StorageResult<Vec<String>>;
}
