//! Object client boundary
//!
//! `ObjectClient` is the only I/O dependency of the storage core: a flat,
//! key-addressed blob store. Keys are opaque strings; a key ending in `/` is a
//! directory marker by convention of the core, not of the client.

use crate::traits::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use std::collections::HashMap;
use strata_core::constants::DIRECTORY_CONTENT_TYPE;

/// Stream of descriptors produced by `ObjectClient::list`.
pub type ObjectStream<'a> = BoxStream<'a, StorageResult<ObjectDescriptor>>;

/// Metadata of a stored object as reported by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDescriptor {
    /// Full object key.
    pub name: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub metadata: HashMap<String, String>,
}

impl ObjectDescriptor {
    /// Descriptor of a regular object.
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            content_type: None,
            created: None,
            updated: None,
            metadata: HashMap::new(),
        }
    }

    /// Synthetic descriptor for a directory prefix, e.g. one produced by an
    /// immediate-children listing when no marker object backs it.
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            content_type: Some(DIRECTORY_CONTENT_TYPE.to_string()),
            ..Self::new(name, 0)
        }
    }
}

/// Options for `ObjectClient::list`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Hint for how many descriptors to fetch per round trip. Clients may ignore it.
    pub page_size: Option<usize>,
    /// Only return keys with no further `/` after the prefix, plus one synthetic
    /// directory descriptor (`prefix + child + "/"`) per deeper child.
    pub immediate_children_only: bool,
}

impl ListOptions {
    pub fn recursive() -> Self {
        Self::default()
    }

    pub fn immediate_children() -> Self {
        Self {
            immediate_children_only: true,
            ..Self::default()
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

/// Flat object store client
///
/// Implementations must be safe to call concurrently. Credentials, connection
/// setup and transport retries are the client's concern.
#[async_trait]
pub trait ObjectClient: Send + Sync {
    /// Read an object, `None` when the key does not exist.
    async fn get(&self, key: &str) -> StorageResult<Option<Bytes>>;

    /// Describe an object without reading it, `None` when the key does not exist.
    async fn head(&self, key: &str) -> StorageResult<Option<ObjectDescriptor>>;

    /// Write an object, replacing any previous content, and return the committed descriptor.
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> StorageResult<ObjectDescriptor>;

    /// Every object whose key starts with `prefix` (plain string prefix).
    fn list(&self, prefix: &str, options: ListOptions) -> ObjectStream<'_>;

    /// Server-side copy. Fails with `NotFound` when the source is missing.
    async fn copy(&self, from: &str, to: &str) -> StorageResult<()>;

    /// Delete an object. Returns `false` when there was nothing to delete.
    async fn delete(&self, key: &str) -> StorageResult<bool>;
}
