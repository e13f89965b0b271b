use crate::client::{ListOptions, ObjectClient, ObjectDescriptor, ObjectStream};
use crate::keys;
use crate::traits::{StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::future;
use futures::stream::{self, StreamExt, TryStreamExt};
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::{Path, PathPart};
use object_store::Error as ObjectStoreError;
use object_store::{ObjectMeta, ObjectStore, ObjectStoreExt, PutPayload, Result as ObjectResult};
use std::collections::HashMap;
use strata_core::constants::{DIRECTORY_CONTENT_TYPE, SEPARATOR};

/// Final path segment holding a directory marker.
///
/// `object_store` paths cannot end with a delimiter, so the marker key `a/b/`
/// is stored as the object `a/b/..dir`. Resolved keys never contain `..`, so
/// no file key maps onto this segment.
pub const MARKER_SEGMENT: &str = "..dir";

/// Object client over any `object_store` backend
#[derive(Debug, Clone)]
pub struct ObjectStoreClient<S> {
    store: S,
    bucket: String,
}

/// S3 (or S3-compatible) object client
pub type S3ObjectClient = ObjectStoreClient<AmazonS3>;

impl S3ObjectClient {
    /// Create a new S3 object client
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        // Credentials come from the environment; bucket and region are explicit.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(ObjectStoreClient::from_store(store, bucket))
    }
}

impl<S: ObjectStore> ObjectStoreClient<S> {
    pub fn from_store(store: S, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Map an object key to its `object_store` location.
///
/// Every segment goes through `PathPart`, which percent-encodes characters
/// `object_store` does not allow (`%` included, so the encoding is reversible).
pub fn key_to_path(key: &str) -> Path {
    let segments = key.split(SEPARATOR).filter(|segment| !segment.is_empty());

    if key.is_empty() || key.ends_with(SEPARATOR) {
        Path::from_iter(segments.chain(std::iter::once(MARKER_SEGMENT)))
    } else {
        Path::from_iter(segments)
    }
}

/// Map an `object_store` location back to the object key, decoding each segment.
pub fn path_to_key(path: &Path) -> StorageResult<String> {
    let parts: Vec<PathPart<'_>> = path.parts().collect();
    let (segments, is_marker) = match parts.split_last() {
        Some((last, rest)) if part_str(last) == MARKER_SEGMENT => (rest, true),
        _ => (parts.as_slice(), false),
    };

    let mut key = String::new();
    for segment in segments {
        let decoded = urlencoding::decode(part_str(segment)).map_err(|e| {
            StorageError::BackendError(format!("Undecodable object location {}: {}", path, e))
        })?;
        key.push(SEPARATOR);
        key.push_str(&decoded);
    }

    if is_marker || key.is_empty() {
        key.push(SEPARATOR);
    }
    Ok(key)
}

fn part_str<'p>(part: &'p PathPart<'_>) -> &'p str {
    part.as_ref()
}

/// Location to list for a string prefix: its parent directory, `None` for the root.
fn listing_directory(prefix: &str) -> Option<Path> {
    let directory = prefix
        .rfind(SEPARATOR)
        .map(|index| &prefix[..index])
        .unwrap_or_default();

    let mut segments = directory
        .split(SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .peekable();
    segments.peek()?;
    Some(Path::from_iter(segments))
}

fn descriptor_from_meta(meta: &ObjectMeta) -> StorageResult<ObjectDescriptor> {
    let name = path_to_key(&meta.location)?;
    let content_type = name
        .ends_with(SEPARATOR)
        .then(|| DIRECTORY_CONTENT_TYPE.to_string());

    Ok(ObjectDescriptor {
        name,
        size: meta.size,
        content_type,
        created: None,
        updated: Some(meta.last_modified),
        metadata: HashMap::new(),
    })
}

fn backend_error(e: ObjectStoreError) -> StorageError {
    StorageError::BackendError(e.to_string())
}

#[async_trait]
impl<S: ObjectStore> ObjectClient for ObjectStoreClient<S> {
    async fn get(&self, key: &str) -> StorageResult<Option<Bytes>> {
        let start = std::time::Instant::now();
        let location = key_to_path(key);

        let result: ObjectResult<_> = self.store.get(&location).await;

        let result = match result {
            Ok(result) => result,
            Err(ObjectStoreError::NotFound { .. }) => return Ok(None),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Object download failed"
                );
                return Err(backend_error(e));
            }
        };

        let bytes = result.bytes().await.map_err(backend_error)?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object download successful"
        );

        Ok(Some(bytes))
    }

    async fn head(&self, key: &str) -> StorageResult<Option<ObjectDescriptor>> {
        let location = key_to_path(key);
        match self.store.head(&location).await {
            Ok(meta) => descriptor_from_meta(&meta).map(Some),
            Err(ObjectStoreError::NotFound { .. }) => Ok(None),
            Err(e) => Err(backend_error(e)),
        }
    }

    async fn put(
        &self,
        key: &str,
        data: Bytes,
        _content_type: Option<&str>,
    ) -> StorageResult<ObjectDescriptor> {
        let start = std::time::Instant::now();
        let size = data.len() as u64;
        let location = key_to_path(key);

        let result: ObjectResult<_> = self.store.put(&location, PutPayload::from(data)).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Object upload failed"
            );
            backend_error(e)
        })?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object upload successful"
        );

        let mut descriptor = ObjectDescriptor::new(key, size);
        descriptor.updated = Some(Utc::now());
        if key.ends_with(SEPARATOR) {
            descriptor.content_type = Some(DIRECTORY_CONTENT_TYPE.to_string());
        }
        Ok(descriptor)
    }

    fn list(&self, prefix: &str, options: ListOptions) -> ObjectStream<'_> {
        let directory = listing_directory(prefix);
        let prefix = prefix.to_string();
        let keep = move |descriptor: &ObjectDescriptor| {
            future::ready(descriptor.name.starts_with(prefix.as_str()))
        };

        if options.immediate_children_only {
            let store = &self.store;
            let listing = async move {
                let result = store
                    .list_with_delimiter(directory.as_ref())
                    .await
                    .map_err(backend_error)?;

                let mut entries = result
                    .objects
                    .iter()
                    .map(descriptor_from_meta)
                    .collect::<StorageResult<Vec<_>>>()?;
                for common in &result.common_prefixes {
                    let directory = keys::as_directory(&path_to_key(common)?);
                    entries.push(ObjectDescriptor::directory(directory));
                }
                Ok::<_, StorageError>(entries)
            };

            stream::once(listing)
                .map_ok(|entries| stream::iter(entries.into_iter().map(Ok::<_, StorageError>)))
                .try_flatten()
                .try_filter(keep)
                .boxed()
        } else {
            self.store
                .list(directory.as_ref())
                .map_err(backend_error)
                .and_then(|meta| future::ready(descriptor_from_meta(&meta)))
                .try_filter(keep)
                .boxed()
        }
    }

    async fn copy(&self, from: &str, to: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let source = key_to_path(from);
        let target = key_to_path(to);

        let copy_result: ObjectResult<_> = self.store.copy(&source, &target).await;

        copy_result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(from.to_string()),
            other => backend_error(other),
        })?;

        tracing::debug!(
            from_key = %from,
            to_key = %to,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object copy successful"
        );

        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<bool> {
        let location = key_to_path(key);

        // Deleting a missing S3 object succeeds silently; head tells the two apart.
        match self.store.head(&location).await {
            Ok(_) => {}
            Err(ObjectStoreError::NotFound { .. }) => return Ok(false),
            Err(e) => return Err(backend_error(e)),
        }

        let result: ObjectResult<_> = self.store.delete(&location).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                "Object delete failed"
            );
            backend_error(e)
        })?;

        Ok(true)
    }
}
