//! Common test utilities.

use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;

use reportd::policy::TaskIdPolicy;
use reportd::server::{self, AppState};
use reportd::store::ReportStore;
use reportd::store::file::FileSnapshotStore;

/// Create a test `AppState` with sensible defaults.
pub fn test_app_state() -> AppState {
    let tmp = TempDir::new().unwrap();

    // Leak the TempDir so it doesn't get cleaned up during the test.
    let tmp = Box::leak(Box::new(tmp));

    AppState {
        reports: ReportStore::new(),
        snapshots: Arc::new(FileSnapshotStore::new(tmp.path().join("snapshots"))),
        policy: Arc::new(TaskIdPolicy::default()),
    }
}

/// Create a test app with empty state.
pub fn test_app() -> Router {
    server::build_app(test_app_state(), 30, 64)
}
