use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::handlers;
use crate::policy::TaskIdPolicy;
use crate::store::{ReportStore, SnapshotStore};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub reports: ReportStore,
    pub snapshots: Arc<dyn SnapshotStore>,
    pub policy: Arc<TaskIdPolicy>,
}

// ============================================================================
// Server Setup
// ============================================================================

/// Maximum JSON report body size (after transport decompression).
const MAX_REPORT_BODY_BYTES: usize = 2 * 1024 * 1024; // 2 MB

/// Maximum multipart snapshot upload size.
const MAX_SNAPSHOT_BODY_BYTES: usize = 256 * 1024 * 1024; // 256 MB

pub fn build_app(state: AppState, request_timeout_seconds: u64, max_connections: usize) -> Router {
    // Report routes - small JSON bodies, request timeout applies
    let report_routes = Router::new()
        .route("/report", post(handlers::submit_report))
        .route("/report/list", get(handlers::list_reports))
        .route("/report/{task_id}", get(handlers::get_report))
        .route("/health", get(handlers::health))
        .with_state(state.clone())
        .layer(DefaultBodyLimit::max(MAX_REPORT_BODY_BYTES))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )));

    // Snapshot routes - large bodies and streamed downloads, no request
    // timeout (a slow upload or download would trip it)
    let snapshot_routes = Router::new()
        .route("/snapshot", post(handlers::upload_snapshot))
        .route("/snapshot/{task_id}", get(handlers::snapshot_exists))
        .route(
            "/snapshot/download/{task_id}",
            get(handlers::download_snapshot),
        )
        .with_state(state.clone())
        .layer(DefaultBodyLimit::max(MAX_SNAPSHOT_BODY_BYTES));

    Router::new()
        .route("/livez", get(handlers::livez))
        .route("/version", get(handlers::version))
        .with_state(state)
        .merge(report_routes)
        .merge(snapshot_routes)
        .layer(ConcurrencyLimitLayer::new(max_connections))
}
