use crate::client::{ListOptions, ObjectClient, ObjectDescriptor, ObjectStream};
use crate::traits::{StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use strata_core::constants::SEPARATOR;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: Option<String>,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
    metadata: HashMap<String, String>,
}

impl StoredObject {
    fn descriptor(&self, key: &str) -> ObjectDescriptor {
        ObjectDescriptor {
            name: key.to_string(),
            size: self.data.len() as u64,
            content_type: self.content_type.clone(),
            created: Some(self.created),
            updated: Some(self.updated),
            metadata: self.metadata.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct Faults {
    failing_copies: HashSet<String>,
    rejected_deletes: HashSet<String>,
    failing_deletes: HashSet<String>,
}

/// In-memory object client
///
/// Keeps objects in a sorted map with plain string-prefix listing, mirroring
/// what a bucket offers. Intended for tests and local development; faults can
/// be injected per key to exercise partial batch failures.
#[derive(Debug, Default)]
pub struct InMemoryObjectClient {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    faults: RwLock<Faults>,
    deletes_attempted: AtomicUsize,
}

impl InMemoryObjectClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn objects(&self) -> RwLockReadGuard<'_, BTreeMap<String, StoredObject>> {
        self.objects.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn objects_mut(&self) -> RwLockWriteGuard<'_, BTreeMap<String, StoredObject>> {
        self.objects.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn faults(&self) -> RwLockReadGuard<'_, Faults> {
        self.faults.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn faults_mut(&self) -> RwLockWriteGuard<'_, Faults> {
        self.faults.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects().is_empty()
    }

    /// All stored keys in order.
    pub fn keys(&self) -> Vec<String> {
        self.objects().keys().cloned().collect()
    }

    /// Number of delete calls received, whatever their outcome.
    pub fn deletes_attempted(&self) -> usize {
        self.deletes_attempted.load(Ordering::SeqCst)
    }

    /// Make every copy whose source is `key` fail with a backend error.
    pub fn fail_copies_from(&self, key: &str) {
        self.faults_mut().failing_copies.insert(key.to_string());
    }

    /// Make deletes of `key` return `false` without removing anything.
    pub fn reject_deletes_of(&self, key: &str) {
        self.faults_mut().rejected_deletes.insert(key.to_string());
    }

    /// Make deletes of `key` fail with a backend error.
    pub fn fail_deletes_of(&self, key: &str) {
        self.faults_mut().failing_deletes.insert(key.to_string());
    }

    fn immediate_children(
        objects: &BTreeMap<String, StoredObject>,
        prefix: &str,
    ) -> Vec<ObjectDescriptor> {
        let mut seen = BTreeSet::new();
        let mut children = Vec::new();

        for (key, object) in objects.range(prefix.to_string()..) {
            let Some(remainder) = key.strip_prefix(prefix) else {
                break;
            };

            match remainder.find(SEPARATOR) {
                Some(index) if index + 1 < remainder.len() => {
                    let directory = format!("{}{}", prefix, &remainder[..=index]);
                    if seen.insert(directory.clone()) {
                        children.push(ObjectDescriptor::directory(directory));
                    }
                }
                _ => {
                    if seen.insert(key.clone()) {
                        children.push(object.descriptor(key));
                    }
                }
            }
        }

        children
    }
}

#[async_trait]
impl ObjectClient for InMemoryObjectClient {
    async fn get(&self, key: &str) -> StorageResult<Option<Bytes>> {
        Ok(self.objects().get(key).map(|object| object.data.clone()))
    }

    async fn head(&self, key: &str) -> StorageResult<Option<ObjectDescriptor>> {
        Ok(self.objects().get(key).map(|object| object.descriptor(key)))
    }

    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> StorageResult<ObjectDescriptor> {
        let now = Utc::now();
        let mut objects = self.objects_mut();
        let created = objects.get(key).map(|existing| existing.created).unwrap_or(now);

        let object = StoredObject {
            data,
            content_type: content_type.map(String::from),
            created,
            updated: now,
            metadata: HashMap::new(),
        };
        let descriptor = object.descriptor(key);
        objects.insert(key.to_string(), object);

        Ok(descriptor)
    }

    fn list(&self, prefix: &str, options: ListOptions) -> ObjectStream<'_> {
        let objects = self.objects();

        // Snapshot under the lock; the stream is consumed after it is released.
        let descriptors: Vec<ObjectDescriptor> = if options.immediate_children_only {
            Self::immediate_children(&objects, prefix)
        } else {
            objects
                .range(prefix.to_string()..)
                .take_while(|(key, _)| key.starts_with(prefix))
                .map(|(key, object)| object.descriptor(key))
                .collect()
        };

        stream::iter(descriptors.into_iter().map(Ok)).boxed()
    }

    async fn copy(&self, from: &str, to: &str) -> StorageResult<()> {
        if self.faults().failing_copies.contains(from) {
            return Err(StorageError::BackendError(format!(
                "Injected copy failure for {}",
                from
            )));
        }

        let mut objects = self.objects_mut();
        let source = objects
            .get(from)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(from.to_string()))?;

        let now = Utc::now();
        objects.insert(
            to.to_string(),
            StoredObject {
                created: now,
                updated: now,
                ..source
            },
        );

        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<bool> {
        self.deletes_attempted.fetch_add(1, Ordering::SeqCst);

        {
            let faults = self.faults();
            if faults.failing_deletes.contains(key) {
                return Err(StorageError::BackendError(format!(
                    "Injected delete failure for {}",
                    key
                )));
            }
            if faults.rejected_deletes.contains(key) {
                return Ok(false);
            }
        }

        Ok(self.objects_mut().remove(key).is_some())
    }
}
