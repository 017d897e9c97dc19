//! File-backed snapshot blob storage.
//!
//! One blob file per task identifier:
//! ```text
//! {snapshots_dir}/
//!   {task_id}.snapshot
//! ```
//!
//! Writes go to a uniquely-named temp file in the same directory, then an
//! atomic rename puts the blob in place. Readers only ever see the path
//! `{task_id}.snapshot`, so a partially-written blob is never visible.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs::{self, File};

use crate::store::error::{StorageError, StorageResult};
use crate::store::snapshot::SnapshotStore;

/// Sequence for temp file names, so concurrent writes to the same task
/// identifier never share a temp path.
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// File-based implementation of [`SnapshotStore`].
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    snapshots_dir: PathBuf,
}

impl FileSnapshotStore {
    /// Create a new file snapshot store.
    ///
    /// The snapshots directory is created when the first blob is stored.
    pub fn new(snapshots_dir: impl Into<PathBuf>) -> Self {
        Self {
            snapshots_dir: snapshots_dir.into(),
        }
    }

    /// Get the blob file path for a task identifier.
    fn blob_path(&self, task_id: &str) -> PathBuf {
        self.snapshots_dir.join(format!("{task_id}.snapshot"))
    }

    /// Ensure the snapshots directory exists.
    async fn ensure_dir(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.snapshots_dir)
            .await
            .map_err(|e| StorageError::file_io(&self.snapshots_dir, e))
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn put(&self, task_id: &str, bytes: &[u8]) -> StorageResult<()> {
        self.ensure_dir().await?;

        let final_path = self.blob_path(task_id);
        let temp_path = self.snapshots_dir.join(format!(
            "{task_id}.snapshot.tmp.{}",
            TMP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));

        // Write to temp file first
        if let Err(e) = fs::write(&temp_path, bytes).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::file_io(&temp_path, e));
        }

        // Atomic rename
        fs::rename(&temp_path, &final_path)
            .await
            .map_err(|e| StorageError::file_io(&final_path, e))?;

        Ok(())
    }

    async fn exists(&self, task_id: &str) -> bool {
        fs::metadata(self.blob_path(task_id))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    async fn open(&self, task_id: &str) -> StorageResult<Option<File>> {
        let path = self.blob_path(task_id);

        match File::open(&path).await {
            Ok(f) => Ok(Some(f)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::file_io(&path, e)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    fn create_store(temp_dir: &TempDir) -> FileSnapshotStore {
        FileSnapshotStore::new(temp_dir.path().join("snapshots"))
    }

    async fn read_blob(store: &FileSnapshotStore, task_id: &str) -> Vec<u8> {
        let mut file = store.open(task_id).await.unwrap().unwrap();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).await.unwrap();
        contents
    }

    #[tokio::test]
    async fn put_then_open_round_trips_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_store(&temp_dir);

        let payload = b"\x00\x01binary snapshot payload\xff";
        store.put("snapshot-1", payload).await.unwrap();

        assert_eq!(read_blob(&store, "snapshot-1").await, payload);
    }

    #[tokio::test]
    async fn exists_transitions_with_put() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_store(&temp_dir);

        assert!(!store.exists("snapshot-1").await);
        store.put("snapshot-1", b"data").await.unwrap();
        assert!(store.exists("snapshot-1").await);
    }

    #[tokio::test]
    async fn put_overwrites_existing_blob() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_store(&temp_dir);

        store.put("snapshot-1", b"first").await.unwrap();
        store.put("snapshot-1", b"second").await.unwrap();

        assert_eq!(read_blob(&store, "snapshot-1").await, b"second");
    }

    #[tokio::test]
    async fn open_nonexistent_returns_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_store(&temp_dir);

        assert!(store.open("snapshot-missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn blobs_are_named_after_the_task_id() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_store(&temp_dir);

        store.put("scan-7", b"data").await.unwrap();
        assert!(
            temp_dir
                .path()
                .join("snapshots")
                .join("scan-7.snapshot")
                .exists()
        );
    }

    #[tokio::test]
    async fn no_temp_files_remain_after_put() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_store(&temp_dir);

        store.put("snapshot-1", b"data").await.unwrap();

        let mut entries = fs::read_dir(temp_dir.path().join("snapshots")).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        assert_eq!(names, vec!["snapshot-1.snapshot"]);
    }

    #[tokio::test]
    async fn concurrent_puts_to_same_id_leave_one_intact_blob() {
        let temp_dir = TempDir::new().unwrap();
        let store = create_store(&temp_dir);

        let payloads: Vec<Vec<u8>> = (0u8..8).map(|i| vec![i; 4096]).collect();
        let mut handles = Vec::new();
        for payload in payloads.clone() {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.put("snapshot-race", &payload).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // The surviving blob is whichever write renamed last, and it must be
        // exactly one of the submitted payloads.
        let survivor = read_blob(&store, "snapshot-race").await;
        assert!(payloads.iter().any(|p| *p == survivor));
    }
}
