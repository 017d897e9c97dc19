//! File-based storage implementations.

mod snapshot;

pub use snapshot::FileSnapshotStore;
