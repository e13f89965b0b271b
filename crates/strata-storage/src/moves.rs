//! Move as copy-then-delete.
//!
//! Every copy is queued before every delete on a single batch, and the batch
//! stops at the first failing entry. A failed copy therefore leaves all sources
//! in place; objects copied before it exist in both locations. Nothing is
//! rolled back.

use crate::attributes::FileType;
use crate::batch::{ObjectBatch, PendingResult};
use crate::client::{ListOptions, ObjectClient};
use crate::keys;
use crate::traits::{StorageError, StorageResult};
use futures::TryStreamExt;

/// Relocate the object or subtree at `from_key` to `to_key`.
///
/// Both keys are given without a trailing separator for directories. Returns
/// the number of objects moved.
pub async fn move_objects(
    client: &dyn ObjectClient,
    source_type: FileType,
    from_key: &str,
    to_key: &str,
) -> StorageResult<usize> {
    let pairs = match source_type {
        FileType::File if from_key == to_key => {
            return Err(StorageError::InvalidPath(format!(
                "Cannot move {} onto itself",
                from_key
            )));
        }
        FileType::File => vec![(from_key.to_string(), to_key.to_string())],
        FileType::Directory => directory_pairs(client, from_key, to_key).await?,
    };

    let mut batch = ObjectBatch::new(client);
    let mut copies: Vec<(String, PendingResult)> = pairs
        .iter()
        .map(|(source, target)| (source.clone(), batch.copy(source.as_str(), target.as_str())))
        .collect();
    let mut deletes: Vec<(String, PendingResult)> = pairs
        .iter()
        .map(|(source, _)| (source.clone(), batch.delete(source.as_str())))
        .collect();

    batch.submit().await?;

    let failed: Vec<String> = copies
        .iter_mut()
        .chain(deletes.iter_mut())
        .filter_map(|(key, pending)| (!pending.is_confirmed()).then(|| key.clone()))
        .collect();

    if !failed.is_empty() {
        return Err(StorageError::PartialBatchFailure {
            failed,
            cause: None,
        });
    }

    Ok(pairs.len())
}

/// Source/target pairs for every object under the `from_key` directory,
/// its own marker included.
async fn directory_pairs(
    client: &dyn ObjectClient,
    from_key: &str,
    to_key: &str,
) -> StorageResult<Vec<(String, String)>> {
    let source_prefix = keys::as_directory(from_key);
    let target_prefix = keys::as_directory(to_key);

    if target_prefix.starts_with(&source_prefix) {
        return Err(StorageError::InvalidPath(format!(
            "Cannot move {} into itself ({})",
            from_key, to_key
        )));
    }

    let blobs: Vec<_> = client
        .list(&source_prefix, ListOptions::recursive())
        .try_collect()
        .await?;

    Ok(blobs
        .into_iter()
        .filter_map(|blob| {
            let suffix = blob.name.strip_prefix(source_prefix.as_str())?.to_string();
            Some((blob.name, format!("{}{}", target_prefix, suffix)))
        })
        .collect())
}

#[cfg(all(test, feature = "storage-memory"))]
mod tests {
    use super::*;
    use crate::memory::InMemoryObjectClient;
    use bytes::Bytes;

    async fn seed(client: &InMemoryObjectClient, keys: &[&str]) {
        for key in keys {
            client
                .put(key, Bytes::from(key.to_string()), None)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_moves_single_file() {
        let client = InMemoryObjectClient::new();
        seed(&client, &["/t/a.yml"]).await;

        let moved = move_objects(&client, FileType::File, "/t/a.yml", "/t/b.yml")
            .await
            .unwrap();
        assert_eq!(moved, 1);
        assert!(!client.contains("/t/a.yml"));
        assert_eq!(
            client.get("/t/b.yml").await.unwrap(),
            Some(Bytes::from_static(b"/t/a.yml"))
        );
    }

    #[tokio::test]
    async fn test_moves_directory_with_marker() {
        let client = InMemoryObjectClient::new();
        seed(&client, &["/t/d/", "/t/d/1.yml", "/t/d/sub/", "/t/d/sub/2.yml", "/t/dd/3.yml"]).await;

        let moved = move_objects(&client, FileType::Directory, "/t/d", "/t/moved")
            .await
            .unwrap();
        assert_eq!(moved, 4);
        for key in ["/t/moved/", "/t/moved/1.yml", "/t/moved/sub/", "/t/moved/sub/2.yml"] {
            assert!(client.contains(key), "{} missing", key);
        }
        assert!(!client.contains("/t/d/"));
        assert!(client.contains("/t/dd/3.yml"));
    }

    #[tokio::test]
    async fn test_failed_copy_keeps_all_sources() {
        let client = InMemoryObjectClient::new();
        seed(&client, &["/t/d/", "/t/d/1.yml", "/t/d/2.yml"]).await;
        client.fail_copies_from("/t/d/2.yml");

        let result = move_objects(&client, FileType::Directory, "/t/d", "/t/e").await;
        assert!(matches!(result, Err(StorageError::BackendError(_))));

        for key in ["/t/d/", "/t/d/1.yml", "/t/d/2.yml"] {
            assert!(client.contains(key), "source {} must remain", key);
        }
        assert!(client.contains("/t/e/1.yml"));
        assert!(!client.contains("/t/e/2.yml"));
    }

    #[tokio::test]
    async fn test_rejects_move_into_own_subtree() {
        let client = InMemoryObjectClient::new();
        seed(&client, &["/t/d/", "/t/d/1.yml"]).await;

        let result = move_objects(&client, FileType::Directory, "/t/d", "/t/d/inner").await;
        assert!(matches!(result, Err(StorageError::InvalidPath(_))));
        assert!(client.contains("/t/d/1.yml"));
    }

    #[tokio::test]
    async fn test_unconfirmed_delete_is_reported() {
        let client = InMemoryObjectClient::new();
        seed(&client, &["/t/a.yml"]).await;
        client.reject_deletes_of("/t/a.yml");

        let result = move_objects(&client, FileType::File, "/t/a.yml", "/t/b.yml").await;
        match result {
            Err(StorageError::PartialBatchFailure { failed, cause }) => {
                assert_eq!(cause, None);
                assert_eq!(failed, vec!["/t/a.yml".to_string()])
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(client.contains("/t/b.yml"));
    }
}
