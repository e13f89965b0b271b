//! Prefix-scoped batch deletion.

use crate::batch::{ObjectBatch, PendingResult};
use crate::client::{ListOptions, ObjectClient};
use crate::traits::{StorageError, StorageResult};
use futures::TryStreamExt;

/// Delete every object whose key starts with `prefix_key`, markers included.
///
/// `to_uri` maps each key to the caller-visible URI that is reported back.
/// When nothing matches no batch is submitted. If any delete does not confirm,
/// the whole call fails with `PartialBatchFailure` naming every such URI, even
/// though other deletes may have gone through. A store error that halted the
/// batch is kept as the failure's `cause`.
pub async fn delete_by_prefix<F>(
    client: &dyn ObjectClient,
    prefix_key: &str,
    to_uri: F,
) -> StorageResult<Vec<String>>
where
    F: Fn(&str) -> String,
{
    let blobs: Vec<_> = client
        .list(prefix_key, ListOptions::recursive())
        .try_collect()
        .await?;

    if blobs.is_empty() {
        tracing::debug!(prefix = %prefix_key, "Nothing to delete under prefix");
        return Ok(Vec::new());
    }

    let mut batch = ObjectBatch::new(client);
    let mut results: Vec<(String, PendingResult)> = blobs
        .iter()
        .map(|blob| (to_uri(blob.name.as_str()), batch.delete(blob.name.as_str())))
        .collect();

    // A halted batch leaves the remaining results unresolved; they are reported below.
    let cause = match batch.submit().await {
        Ok(()) => None,
        Err(e) => {
            tracing::warn!(error = %e, prefix = %prefix_key, "Batch delete interrupted");
            Some(e.to_string())
        }
    };

    let failed: Vec<String> = results
        .iter_mut()
        .filter_map(|(uri, pending)| (!pending.is_confirmed()).then(|| uri.clone()))
        .collect();

    if !failed.is_empty() {
        tracing::error!(
            prefix = %prefix_key,
            failed = failed.len(),
            total = results.len(),
            "Batch delete partially failed"
        );
        return Err(StorageError::PartialBatchFailure { failed, cause });
    }

    tracing::info!(
        prefix = %prefix_key,
        count = results.len(),
        "Batch delete successful"
    );

    Ok(results.into_iter().map(|(uri, _)| uri).collect())
}

#[cfg(all(test, feature = "storage-memory"))]
mod tests {
    use super::*;
    use crate::memory::InMemoryObjectClient;
    use bytes::Bytes;

    async fn seed(client: &InMemoryObjectClient, keys: &[&str]) {
        for key in keys {
            client.put(key, Bytes::new(), None).await.unwrap();
        }
    }

    fn uri(key: &str) -> String {
        format!("strata://{}", key)
    }

    #[tokio::test]
    async fn test_deletes_everything_under_prefix() {
        let client = InMemoryObjectClient::new();
        seed(&client, &["/p/", "/p/root.yml", "/p/level1/", "/p/level1/1.yml", "/q/keep.yml"]).await;

        let mut deleted = delete_by_prefix(&client, "/p/", uri).await.unwrap();
        deleted.sort();
        assert_eq!(
            deleted,
            vec![
                "strata:///p/",
                "strata:///p/level1/",
                "strata:///p/level1/1.yml",
                "strata:///p/root.yml",
            ]
        );
        assert_eq!(client.len(), 1);
        assert!(client.contains("/q/keep.yml"));
    }

    #[tokio::test]
    async fn test_no_match_returns_empty() {
        let client = InMemoryObjectClient::new();
        seed(&client, &["/q/keep.yml"]).await;

        let deleted = delete_by_prefix(&client, "/p/", uri).await.unwrap();
        assert!(deleted.is_empty());
        assert_eq!(client.deletes_attempted(), 0);
    }

    #[tokio::test]
    async fn test_partial_failure_names_every_offender() {
        let client = InMemoryObjectClient::new();
        seed(&client, &["/p/a.yml", "/p/b.yml", "/p/c.yml"]).await;
        client.reject_deletes_of("/p/a.yml");
        client.reject_deletes_of("/p/c.yml");

        let result = delete_by_prefix(&client, "/p/", uri).await;
        match result {
            Err(StorageError::PartialBatchFailure { failed, cause }) => {
                assert_eq!(failed, vec!["strata:///p/a.yml", "strata:///p/c.yml"]);
                assert_eq!(cause, None);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!client.contains("/p/b.yml"));
    }

    #[tokio::test]
    async fn test_store_error_reports_unresolved_entries() {
        let client = InMemoryObjectClient::new();
        seed(&client, &["/p/a.yml", "/p/b.yml"]).await;
        client.fail_deletes_of("/p/a.yml");

        let error = delete_by_prefix(&client, "/p/", uri).await.unwrap_err();
        assert!(error
            .to_string()
            .contains("Injected delete failure for /p/a.yml"));
        match error {
            StorageError::PartialBatchFailure { failed, cause } => {
                assert_eq!(failed, vec!["strata:///p/a.yml", "strata:///p/b.yml"]);
                assert!(cause.is_some_and(|c| c.starts_with("Storage backend error")));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
