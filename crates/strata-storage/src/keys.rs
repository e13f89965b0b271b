//! Path resolution and key layout.
//!
//! Key format: without a tenant, the key is the logical path itself
//! (`/a/b.yml`); with a tenant it is `/{tenant_id}/a/b.yml`. A key ending in
//! `/` names a directory marker. Keys never contain `..`.

use crate::traits::{StorageError, StorageResult};
use strata_core::constants::SEPARATOR;

/// A caller path resolved against a tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePath {
    /// Tenant-relative logical path, always starting with `/`.
    pub path: String,
    /// Object key in the store.
    pub key: String,
}

impl StoragePath {
    pub fn is_directory(&self) -> bool {
        self.key.ends_with(SEPARATOR)
    }
}

/// Resolve a tenant and a caller URI into a logical path and an object key.
///
/// A missing URI addresses the root. Any `..` in the URI, before or after
/// percent-decoding, is rejected before the store is ever reached. Repeated
/// separators collapse into one, so `/a//b` and `/a/b` are the same path.
pub fn resolve(tenant_id: Option<&str>, uri: Option<&str>) -> StorageResult<StoragePath> {
    let uri = uri.unwrap_or("/");
    traversal_guard(uri)?;

    let path = uri_path(uri)?;
    traversal_guard(&path)?;

    let path = normalize(&path);
    let key = format!("{}{}", tenant_prefix(tenant_id)?, path);
    Ok(StoragePath { path, key })
}

/// Leading separator, no empty segments, trailing separator kept.
fn normalize(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len() + 1);
    for segment in path.split(SEPARATOR).filter(|segment| !segment.is_empty()) {
        normalized.push(SEPARATOR);
        normalized.push_str(segment);
    }

    if normalized.is_empty() || path.ends_with(SEPARATOR) {
        normalized.push(SEPARATOR);
    }
    normalized
}

/// `/{tenant_id}` for a tenant, empty otherwise.
pub fn tenant_prefix(tenant_id: Option<&str>) -> StorageResult<String> {
    match tenant_id {
        None => Ok(String::new()),
        Some(tenant) => {
            if tenant.is_empty() || tenant.contains(SEPARATOR) || tenant.contains("..") {
                return Err(StorageError::InvalidPath(format!(
                    "Tenant id '{}' must be a single non-empty path segment",
                    tenant
                )));
            }
            Ok(format!("{}{}", SEPARATOR, tenant))
        }
    }
}

// '..' has no meaning in an object store; it would silently become part of the key.
fn traversal_guard(value: &str) -> StorageResult<()> {
    if value.contains("..") {
        return Err(StorageError::InvalidPath(format!(
            "{} should be accessed with its full path and not using relative '..' path",
            value
        )));
    }
    Ok(())
}

/// Extract the decoded path component of a URI.
///
/// `scheme:///a/b` and `scheme://host/a/b` both yield `/a/b`; a URI without a
/// scheme is taken as a path. Query and fragment are dropped.
fn uri_path(uri: &str) -> StorageResult<String> {
    let without_fragment = uri.split('#').next().unwrap_or_default();
    let without_query = without_fragment.split('?').next().unwrap_or_default();

    let raw_path = match without_query.split_once("://") {
        Some((scheme, rest)) if is_scheme(scheme) => match rest.find(SEPARATOR) {
            Some(index) => &rest[index..],
            None => "",
        },
        _ => without_query,
    };

    urlencoding::decode(raw_path)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| StorageError::InvalidPath(format!("{}: {}", uri, e)))
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Ensure a trailing separator.
pub fn as_directory(key: &str) -> String {
    if key.ends_with(SEPARATOR) {
        key.to_string()
    } else {
        format!("{}{}", key, SEPARATOR)
    }
}

/// Everything up to and including the last separator of `key`.
///
/// For a file key this is the directory holding it (`/a/b/c.yml` gives
/// `/a/b/`); a directory key ends with a separator and is returned unchanged.
pub fn containing_directory(key: &str) -> &str {
    match key.rfind(SEPARATOR) {
        Some(index) => &key[..=index],
        None => "",
    }
}

/// Final non-empty segment of a key: `/a/b.yml` and `/a/b/` give `b.yml` and `b`.
pub fn file_name(key: &str) -> &str {
    key.trim_end_matches(SEPARATOR)
        .rsplit(SEPARATOR)
        .next()
        .unwrap_or_default()
}

/// Caller-visible URI of a tenant-relative path.
pub fn to_uri(scheme: &str, path: &str) -> String {
    format!("{}://{}", scheme, path)
}

/// Translate a key back into its tenant-relative path.
pub fn strip_tenant<'k>(tenant_prefix: &str, key: &'k str) -> &'k str {
    key.strip_prefix(tenant_prefix).unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_with_and_without_tenant() {
        let resolved = resolve(Some("acme"), Some("/p/storage/get.yml")).unwrap();
        assert_eq!(resolved.path, "/p/storage/get.yml");
        assert_eq!(resolved.key, "/acme/p/storage/get.yml");

        let resolved = resolve(None, Some("/p/storage/get.yml")).unwrap();
        assert_eq!(resolved.key, "/p/storage/get.yml");
    }

    #[test]
    fn test_resolve_accepts_scheme_and_relative_forms() {
        let with_scheme = resolve(Some("t"), Some("strata:///p/file.yml")).unwrap();
        let with_authority = resolve(Some("t"), Some("strata://host/p/file.yml")).unwrap();
        let relative = resolve(Some("t"), Some("p/file.yml")).unwrap();
        let with_query = resolve(Some("t"), Some("/p/file.yml?version=2#top")).unwrap();

        for resolved in [with_scheme, with_authority, relative, with_query] {
            assert_eq!(resolved.path, "/p/file.yml");
            assert_eq!(resolved.key, "/t/p/file.yml");
        }
    }

    #[test]
    fn test_missing_or_empty_uri_is_root() {
        assert_eq!(resolve(None, None).unwrap().key, "/");
        assert_eq!(resolve(Some("t"), None).unwrap().key, "/t/");
        assert_eq!(resolve(None, Some("strata://")).unwrap().key, "/");
    }

    #[test]
    fn test_repeated_separators_collapse() {
        let resolved = resolve(Some("t"), Some("strata:///p//storage///x.yml")).unwrap();
        assert_eq!(resolved.path, "/p/storage/x.yml");
        assert_eq!(resolved.key, "/t/p/storage/x.yml");

        assert_eq!(resolve(None, Some("//p//")).unwrap().key, "/p/");
        assert_eq!(resolve(None, Some("//")).unwrap().key, "/");
    }

    #[test]
    fn test_percent_encoded_paths_are_decoded() {
        let resolved = resolve(None, Some("/p/my%20file.yml")).unwrap();
        assert_eq!(resolved.path, "/p/my file.yml");
    }

    #[test]
    fn test_traversal_rejected() {
        for uri in [
            "/p/storage/level2/../get.yml",
            "strata:///p/storage/level2/..",
            "../etc/passwd",
            "/p/%2E%2E/secret",
        ] {
            let result = resolve(Some("t"), Some(uri));
            assert!(
                matches!(result, Err(StorageError::InvalidPath(_))),
                "{} should be rejected",
                uri
            );
            assert!(matches!(
                resolve(None, Some(uri)),
                Err(StorageError::InvalidPath(_))
            ));
        }
    }

    #[test]
    fn test_tenant_must_be_single_segment() {
        for tenant in ["", "a/b", "..", "a..b"] {
            assert!(matches!(
                resolve(Some(tenant), Some("/x")),
                Err(StorageError::InvalidPath(_))
            ));
        }
    }

    #[test]
    fn test_key_helpers() {
        assert_eq!(as_directory("/a/b"), "/a/b/");
        assert_eq!(as_directory("/a/b/"), "/a/b/");
        assert_eq!(containing_directory("/a/b/c.yml"), "/a/b/");
        assert_eq!(containing_directory("/a/b/"), "/a/b/");
        assert_eq!(file_name("/a/b/c.yml"), "c.yml");
        assert_eq!(file_name("/a/level1/"), "level1");
        assert_eq!(file_name("/"), "");
        assert_eq!(to_uri("strata", "/a/b"), "strata:///a/b");
        assert_eq!(strip_tenant("/t", "/t/a/b/"), "/a/b/");
        assert_eq!(strip_tenant("", "/a"), "/a");
    }
}
