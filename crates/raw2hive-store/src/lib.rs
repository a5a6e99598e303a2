// raw2hive-store - Object-store access
//
// The engine sees one trait: list keys under a prefix, copy one object
// server-side. Backends:
// - s3: the real thing, via the AWS SDK
// - memory: ordered in-memory objects for tests and local runs

pub mod memory;
pub mod s3;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryStore;
pub use s3::S3Store;

/// A collaborator call against the object store failed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Listing objects under a prefix failed.
    #[error("listing {bucket}/{prefix} failed: {reason}")]
    List {
        bucket: String,
        prefix: String,
        reason: String,
    },

    /// Server-side copy failed.
    #[error("copying {source_bucket}/{source_key} to {destination_bucket}/{destination_key} failed: {reason}")]
    Copy {
        source_bucket: String,
        source_key: String,
        destination_bucket: String,
        destination_key: String,
        reason: String,
    },

    /// The source object vanished between listing and copying.
    #[error("object {bucket}/{key} not found")]
    NotFound { bucket: String, key: String },
}

impl StoreError {
    pub fn list(bucket: &str, prefix: &str, reason: impl ToString) -> Self {
        Self::List {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn copy(
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
        destination_key: &str,
        reason: impl ToString,
    ) -> Self {
        Self::Copy {
            source_bucket: source_bucket.to_string(),
            source_key: source_key.to_string(),
            destination_bucket: destination_bucket.to_string(),
            destination_key: destination_key.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Minimal object-store surface the repartition engine needs.
///
/// Implementations are thin I/O wrappers: no retries, no buffering, no
/// interpretation of key contents.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Every key under `prefix`, in the order the store returns them.
    ///
    /// Implementations follow continuation tokens until the listing is
    /// exhausted; an empty vector means a genuinely empty prefix.
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Copy one object server-side. The source object is left untouched;
    /// an existing destination object is overwritten.
    async fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
        destination_key: &str,
    ) -> Result<(), StoreError>;
}
