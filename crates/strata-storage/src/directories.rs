//! Directory emulation through zero-length marker objects.

use crate::client::{ListOptions, ObjectClient};
use crate::keys;
use crate::traits::StorageResult;
use bytes::Bytes;
use futures::StreamExt;
use strata_core::constants::{DIRECTORY_CONTENT_TYPE, SEPARATOR};

/// Make sure a marker exists for every directory on the way to `path_key`.
///
/// A key without a trailing `/` names a file, and its parent directory is used.
/// Markers are written only where missing; writing one that already exists is
/// harmless. Returns the number of markers written.
pub async fn ensure_directory_markers(
    client: &dyn ObjectClient,
    path_key: &str,
) -> StorageResult<usize> {
    let directory = keys::containing_directory(path_key);
    if directory.is_empty() || directory == "/" {
        return Ok(0);
    }

    if prefix_has_objects(client, directory).await {
        tracing::debug!(directory = %directory, "Directory chain already present");
        return Ok(0);
    }

    let mut written = 0;
    let mut ancestor = String::with_capacity(directory.len());
    ancestor.push(SEPARATOR);

    for segment in directory.split(SEPARATOR).filter(|s| !s.is_empty()) {
        ancestor.push_str(segment);
        ancestor.push(SEPARATOR);

        if marker_exists(client, &ancestor).await {
            continue;
        }

        client
            .put(&ancestor, Bytes::new(), Some(DIRECTORY_CONTENT_TYPE))
            .await?;
        written += 1;
    }

    if written > 0 {
        tracing::info!(
            directory = %directory,
            markers_written = written,
            "Directory markers created"
        );
    }

    Ok(written)
}

// A failed pre-check counts as "absent": creation is attempted and reports real errors.
async fn prefix_has_objects(client: &dyn ObjectClient, prefix: &str) -> bool {
    let mut listing = client.list(prefix, ListOptions::recursive().with_page_size(1));
    match listing.next().await {
        Some(Ok(_)) => true,
        Some(Err(e)) => {
            tracing::warn!(error = %e, prefix = %prefix, "Directory pre-check failed");
            false
        }
        None => false,
    }
}

async fn marker_exists(client: &dyn ObjectClient, marker: &str) -> bool {
    match client.head(marker).await {
        Ok(found) => found.is_some(),
        Err(e) => {
            tracing::warn!(error = %e, marker = %marker, "Directory marker check failed");
            false
        }
    }
}
