//! Prefix listing with directory semantics.

use crate::client::{ListOptions, ObjectClient, ObjectDescriptor};
use crate::traits::StorageResult;
use futures::TryStreamExt;
use strata_core::constants::SEPARATOR;

/// List the objects under `prefix`.
///
/// The prefix object itself and self-reference artifacts are never returned.
/// Without `recursive` only immediate children are kept, with
/// `include_directories` unset directory markers are dropped.
pub async fn list_blobs(
    client: &dyn ObjectClient,
    prefix: &str,
    recursive: bool,
    include_directories: bool,
) -> StorageResult<Vec<ObjectDescriptor>> {
    let options = if recursive {
        ListOptions::recursive()
    } else {
        ListOptions::immediate_children()
    };

    let blobs: Vec<ObjectDescriptor> = client.list(prefix, options).try_collect().await?;
    let listed = blobs.len();

    let kept: Vec<ObjectDescriptor> = blobs
        .into_iter()
        .filter(|blob| keep(prefix, &blob.name, recursive, include_directories))
        .collect();

    tracing::debug!(
        prefix = %prefix,
        recursive,
        listed,
        kept = kept.len(),
        "Listed objects by prefix"
    );

    Ok(kept)
}

fn keep(prefix: &str, name: &str, recursive: bool, include_directories: bool) -> bool {
    let Some(remainder) = name.strip_prefix(prefix) else {
        return false;
    };

    if remainder.is_empty() || remainder == prefix || remainder == "/" {
        return false;
    }

    if !recursive && remainder.trim_end_matches(SEPARATOR).contains(SEPARATOR) {
        return false;
    }

    include_directories || !remainder.ends_with(SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_filters_self_references() {
        assert!(!keep("/t/p/", "/t/p/", true, true));
        assert!(!keep("/t/p/", "/t/p//", true, true));
        assert!(!keep("/t/other/", "/t/p/x", true, true));
        assert!(keep("/t/p/", "/t/p/x", true, true));
    }

    #[test]
    fn test_keep_immediate_children_only() {
        assert!(keep("/p/", "/p/root.yml", false, true));
        assert!(keep("/p/", "/p/level1/", false, true));
        assert!(!keep("/p/", "/p/level1/1.yml", false, true));
        assert!(!keep("/p/", "/p/level1/level2/", false, true));
        assert!(keep("/p/", "/p/level1/level2/", true, true));
    }

    #[test]
    fn test_keep_without_directories() {
        assert!(!keep("/p/", "/p/level1/", true, false));
        assert!(keep("/p/", "/p/level1/1.yml", true, false));
    }
}
