#[cfg(feature = "storage-memory")]
use crate::InMemoryObjectClient;
#[cfg(feature = "storage-s3")]
use crate::S3ObjectClient;
use crate::{ObjectClient, ObjectStorage, StorageBackend, StorageError, StorageResult};
use std::sync::Arc;
use strata_core::StorageConfig;

/// Create the object client selected by configuration
pub async fn create_object_client(config: &StorageConfig) -> StorageResult<Arc<dyn ObjectClient>> {
    match config.backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket()
                .map(String::from)
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = config.s3_region().map(String::from).ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;
            let endpoint = config.s3_endpoint().map(String::from);

            let client = S3ObjectClient::new(bucket, region, endpoint).await?;
            Ok(Arc::new(client))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-memory")]
        StorageBackend::Memory => Ok(Arc::new(InMemoryObjectClient::new())),

        #[cfg(not(feature = "storage-memory"))]
        StorageBackend::Memory => Err(StorageError::ConfigError(
            "Memory storage backend not available (storage-memory feature not enabled)".to_string(),
        )),
    }
}

/// Create the file storage described by configuration
pub async fn create_storage(config: &StorageConfig) -> StorageResult<ObjectStorage> {
    let client = create_object_client(config).await?;

    tracing::info!(
        backend = %config.backend,
        scheme = %config.uri_scheme(),
        "Storage initialized"
    );

    Ok(ObjectStorage::new(client).with_scheme(config.uri_scheme()))
}
