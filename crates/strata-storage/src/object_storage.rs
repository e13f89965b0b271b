//! `FileStorage` over any `ObjectClient`.

use crate::attributes::{FileAttributes, FileType};
use crate::client::ObjectClient;
use crate::deletion;
use crate::directories::ensure_directory_markers;
use crate::keys::{self, StoragePath};
use crate::listing::list_blobs;
use crate::moves::move_objects;
use crate::traits::{FileStorage, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::pin::Pin;
use std::sync::Arc;
use strata_core::constants::{DEFAULT_URI_SCHEME, SEPARATOR};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Hierarchical storage emulated over a flat object store
#[derive(Clone)]
pub struct ObjectStorage {
    client: Arc<dyn ObjectClient>,
    scheme: String,
}

impl ObjectStorage {
    pub fn new(client: Arc<dyn ObjectClient>) -> Self {
        Self {
            client,
            scheme: DEFAULT_URI_SCHEME.to_string(),
        }
    }

    /// Use `scheme` for every returned URI.
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn client(&self) -> &Arc<dyn ObjectClient> {
        &self.client
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    fn uri(&self, path: &str) -> String {
        keys::to_uri(&self.scheme, path)
    }

    /// Attributes of an already resolved path, `None` when neither a file nor a marker exists.
    async fn attributes_of(&self, resolved: &StoragePath) -> StorageResult<Option<FileAttributes>> {
        if !resolved.is_directory() {
            if let Some(descriptor) = self.client.head(&resolved.key).await? {
                return Ok(Some(FileAttributes::from_descriptor(
                    &resolved.key,
                    &descriptor,
                    false,
                )));
            }
        }

        let marker = keys::as_directory(&resolved.key);
        Ok(self
            .client
            .head(&marker)
            .await?
            .map(|descriptor| FileAttributes::from_descriptor(&marker, &descriptor, true)))
    }
}

impl std::fmt::Debug for ObjectStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStorage")
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl FileStorage for ObjectStorage {
    async fn get(&self, tenant_id: Option<&str>, uri: &str) -> StorageResult<Bytes> {
        let resolved = keys::resolve(tenant_id, Some(uri))?;

        self.client
            .get(&resolved.key)
            .await?
            .ok_or_else(|| StorageError::NotFound(resolved.path))
    }

    async fn all_by_prefix(
        &self,
        tenant_id: Option<&str>,
        prefix: &str,
        include_directories: bool,
    ) -> StorageResult<Vec<String>> {
        let resolved = keys::resolve(tenant_id, Some(prefix))?;
        let blobs = list_blobs(self.client.as_ref(), &resolved.key, true, include_directories).await?;

        Ok(blobs
            .iter()
            .filter_map(|blob| blob.name.strip_prefix(resolved.key.as_str()))
            .map(|remainder| self.uri(&format!("{}{}", resolved.path, remainder)))
            .collect())
    }

    async fn list(&self, tenant_id: Option<&str>, uri: &str) -> StorageResult<Vec<FileAttributes>> {
        let resolved = keys::resolve(tenant_id, Some(uri))?;
        let prefix = keys::as_directory(&resolved.key);

        let entries: Vec<FileAttributes> = list_blobs(self.client.as_ref(), &prefix, false, true)
            .await?
            .iter()
            .map(|blob| FileAttributes::from_descriptor(&blob.name, blob, false))
            .collect();

        // The root always exists, marker or not.
        if entries.is_empty() && resolved.path != "/" {
            self.get_attributes(tenant_id, uri).await?;
        }

        Ok(entries)
    }

    async fn exists(&self, tenant_id: Option<&str>, uri: &str) -> StorageResult<bool> {
        let resolved = keys::resolve(tenant_id, Some(uri))?;
        Ok(self.attributes_of(&resolved).await?.is_some())
    }

    async fn size(&self, tenant_id: Option<&str>, uri: &str) -> StorageResult<u64> {
        Ok(self.get_attributes(tenant_id, uri).await?.size)
    }

    async fn last_modified_time(&self, tenant_id: Option<&str>, uri: &str) -> StorageResult<i64> {
        Ok(self
            .get_attributes(tenant_id, uri)
            .await?
            .last_modified_time())
    }

    async fn get_attributes(
        &self,
        tenant_id: Option<&str>,
        uri: &str,
    ) -> StorageResult<FileAttributes> {
        let resolved = keys::resolve(tenant_id, Some(uri))?;

        self.attributes_of(&resolved)
            .await?
            .ok_or_else(|| StorageError::NotFound(resolved.path))
    }

    async fn put(&self, tenant_id: Option<&str>, uri: &str, data: Bytes) -> StorageResult<String> {
        let start = std::time::Instant::now();
        let resolved = keys::resolve(tenant_id, Some(uri))?;

        if resolved.is_directory() {
            return Err(StorageError::InvalidPath(format!(
                "{} is a directory path, file content cannot be written to it",
                resolved.path
            )));
        }

        ensure_directory_markers(self.client.as_ref(), &resolved.key).await?;

        let size = data.len();
        self.client.put(&resolved.key, data, None).await?;

        tracing::info!(
            key = %resolved.key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "File stored"
        );

        Ok(self.uri(&resolved.path))
    }

    async fn put_stream(
        &self,
        tenant_id: Option<&str>,
        uri: &str,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<String> {
        // Resolve first so a bad path fails before the reader is drained.
        keys::resolve(tenant_id, Some(uri))?;

        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer).await?;

        self.put(tenant_id, uri, Bytes::from(buffer)).await
    }

    async fn delete(&self, tenant_id: Option<&str>, uri: &str) -> StorageResult<bool> {
        let start = std::time::Instant::now();
        let resolved = keys::resolve(tenant_id, Some(uri))?;

        let Some(attributes) = self.attributes_of(&resolved).await? else {
            return Ok(false);
        };

        let deleted = match attributes.file_type {
            FileType::Directory => {
                let directory = keys::as_directory(&resolved.path);
                !self.delete_by_prefix(tenant_id, &directory).await?.is_empty()
            }
            FileType::File => self.client.delete(&resolved.key).await?,
        };

        tracing::info!(
            key = %resolved.key,
            directory = attributes.is_directory(),
            deleted,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Path deleted"
        );

        Ok(deleted)
    }

    async fn create_directory(&self, tenant_id: Option<&str>, uri: &str) -> StorageResult<String> {
        let resolved = keys::resolve(tenant_id, Some(uri))?;

        ensure_directory_markers(self.client.as_ref(), &keys::as_directory(&resolved.key)).await?;

        Ok(self.uri(&resolved.path))
    }

    async fn move_path(
        &self,
        tenant_id: Option<&str>,
        from: &str,
        to: &str,
    ) -> StorageResult<String> {
        let start = std::time::Instant::now();
        let source = keys::resolve(tenant_id, Some(from))?;
        let target = keys::resolve(tenant_id, Some(to))?;

        let attributes = self
            .attributes_of(&source)
            .await?
            .ok_or_else(|| StorageError::NotFound(source.path.clone()))?;

        let from_key = source.key.trim_end_matches(SEPARATOR);
        let to_key = target.key.trim_end_matches(SEPARATOR);
        if to_key.is_empty() || to_key == keys::tenant_prefix(tenant_id)? {
            return Err(StorageError::InvalidPath(format!(
                "Cannot move {} onto the root",
                source.path
            )));
        }

        ensure_directory_markers(self.client.as_ref(), to_key).await?;
        let moved = move_objects(self.client.as_ref(), attributes.file_type, from_key, to_key).await?;

        tracing::info!(
            from_key = %from_key,
            to_key = %to_key,
            objects = moved,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Path moved"
        );

        Ok(self.uri(&target.path))
    }

    async fn delete_by_prefix(
        &self,
        tenant_id: Option<&str>,
        prefix: &str,
    ) -> StorageResult<Vec<String>> {
        let resolved = keys::resolve(tenant_id, Some(prefix))?;
        let tenant_prefix = keys::tenant_prefix(tenant_id)?;

        deletion::delete_by_prefix(self.client.as_ref(), &resolved.key, |key| {
            self.uri(keys::strip_tenant(&tenant_prefix, key))
        })
        .await
    }
}

#[cfg(all(test, feature = "storage-memory"))]
mod tests {
    use super::*;
    use crate::memory::InMemoryObjectClient;

    fn storage() -> (Arc<InMemoryObjectClient>, ObjectStorage) {
        let client = Arc::new(InMemoryObjectClient::new());
        let storage = ObjectStorage::new(client.clone());
        (client, storage)
    }

    #[tokio::test]
    async fn test_put_creates_parent_markers() {
        let (client, storage) = storage();

        let uri = storage
            .put(Some("t"), "/a/b/c.yml", Bytes::from_static(b"x"))
            .await
            .unwrap();
        assert_eq!(uri, "strata:///a/b/c.yml");
        assert_eq!(client.keys(), vec!["/t/", "/t/a/", "/t/a/b/", "/t/a/b/c.yml"]);
    }

    #[tokio::test]
    async fn test_put_to_directory_path_is_rejected() {
        let (client, storage) = storage();

        let result = storage.put(None, "/a/", Bytes::from_static(b"x")).await;
        assert!(matches!(result, Err(StorageError::InvalidPath(_))));
        assert!(client.is_empty());
    }

    #[tokio::test]
    async fn test_exists_sees_files_and_markers() {
        let (_, storage) = storage();
        storage.create_directory(None, "/d").await.unwrap();
        storage.put(None, "/f.yml", Bytes::new()).await.unwrap();

        assert!(storage.exists(None, "/d").await.unwrap());
        assert!(storage.exists(None, "/d/").await.unwrap());
        assert!(storage.exists(None, "/f.yml").await.unwrap());
        assert!(!storage.exists(None, "/missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_root_lists_empty() {
        let (_, storage) = storage();
        assert!(storage.list(Some("t"), "/").await.unwrap().is_empty());
        assert!(matches!(
            storage.list(Some("t"), "/nope").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_custom_scheme() {
        let (_, storage) = storage();
        let storage = storage.with_scheme("files");
        assert_eq!(storage.scheme(), "files");

        let uri = storage.create_directory(None, "/d").await.unwrap();
        assert_eq!(uri, "files:///d");
    }

    #[tokio::test]
    async fn test_move_onto_root_is_rejected() {
        let (_, storage) = storage();
        storage.put(Some("t"), "/d/a.yml", Bytes::new()).await.unwrap();

        assert!(matches!(
            storage.move_path(Some("t"), "/d", "/").await,
            Err(StorageError::InvalidPath(_))
        ));
    }
}
