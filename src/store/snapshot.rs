//! Snapshot blob storage trait.
//!
//! A snapshot is an opaque byte blob keyed by task identifier. Unlike
//! reports, snapshots have no TTL and survive until overwritten.

use async_trait::async_trait;
use tokio::fs::File;

use super::error::StorageResult;

/// Storage interface for snapshot blobs.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Write the blob for `task_id`, replacing any existing one.
    ///
    /// The replacement must be atomic from a reader's perspective: a
    /// concurrent read observes either the previous blob or the new one in
    /// full, never a partial write.
    async fn put(&self, task_id: &str, bytes: &[u8]) -> StorageResult<()>;

    /// True iff a blob is currently present for `task_id`.
    async fn exists(&self, task_id: &str) -> bool;

    /// Open the blob for streaming.
    ///
    /// Returns `Ok(None)` if no blob is stored for `task_id`.
    async fn open(&self, task_id: &str) -> StorageResult<Option<File>>;
}
