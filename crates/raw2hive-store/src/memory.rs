//! In-memory backend for tests and local runs
//!
//! Keys list in lexicographic order, matching S3 listing order. Faults can
//! be injected per prefix (listing) and per key (copy) so engine behavior
//! under partial failure is testable without a network.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::{ObjectStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    /// (bucket, key) -> object bytes
    objects: BTreeMap<(String, String), Vec<u8>>,
    /// (bucket, prefix) pairs whose listing fails
    failing_prefixes: HashSet<(String, String)>,
    /// (bucket, key) pairs whose copy fails
    failing_keys: HashSet<(String, String)>,
}

/// Shared in-memory object store; clones see the same state, so tests can
/// hold one handle and inspect what the engine did with another.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, bucket: &str, key: &str, bytes: &[u8]) {
        self.lock()
            .objects
            .insert((bucket.to_string(), key.to_string()), bytes.to_vec());
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.lock()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.get(bucket, key).is_some()
    }

    /// Every key in `bucket`, in listing order.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    /// Make `list_objects` fail for this exact (bucket, prefix) pair.
    pub fn fail_listing(&self, bucket: &str, prefix: &str) {
        self.lock()
            .failing_prefixes
            .insert((bucket.to_string(), prefix.to_string()));
    }

    /// Make every copy of this source key fail.
    pub fn fail_copy(&self, bucket: &str, key: &str) {
        self.lock()
            .failing_keys
            .insert((bucket.to_string(), key.to_string()));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StoreError> {
        let inner = self.lock();
        if inner
            .failing_prefixes
            .contains(&(bucket.to_string(), prefix.to_string()))
        {
            return Err(StoreError::list(bucket, prefix, "injected listing fault"));
        }
        Ok(inner
            .objects
            .keys()
            .filter(|(b, k)| b == bucket && k.starts_with(prefix))
            .map(|(_, k)| k.clone())
            .collect())
    }

    async fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
        destination_key: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner
            .failing_keys
            .contains(&(source_bucket.to_string(), source_key.to_string()))
        {
            return Err(StoreError::copy(
                source_bucket,
                source_key,
                destination_bucket,
                destination_key,
                "injected copy fault",
            ));
        }
        let bytes = inner
            .objects
            .get(&(source_bucket.to_string(), source_key.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                bucket: source_bucket.to_string(),
                key: source_key.to_string(),
            })?;
        inner
            .objects
            .insert((destination_bucket.to_string(), destination_key.to_string()), bytes);
        Ok(())
    }
}
