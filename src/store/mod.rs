//! Storage for reports and snapshot blobs.
//!
//! Reports live in a lock-guarded in-memory map and are lost on restart by
//! design. Snapshots go through the [`SnapshotStore`] trait, with the
//! file-backed implementation in the `file` submodule.

pub mod error;

mod report;
mod snapshot;

pub mod file;

pub use error::{StorageError, StorageResult};
pub use report::{ReportStore, StoredReport};
pub use snapshot::SnapshotStore;
