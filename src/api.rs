//! Shared API types used by the HTTP handlers.
//!
//! These types define the wire contract of the service. The three document
//! fields of a report are opaque JSON objects; the service passes them
//! through unmodified and never inspects their contents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Reports
// ============================================================================

/// Incoming report body for `POST /report`.
///
/// `snapshot_metadata` defaults to an empty object and `timestamp` to the
/// server receive time; the other fields are required and a body missing any
/// of them is rejected as malformed.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportSubmission {
    pub task_id: String,
    pub project_structure: Map<String, Value>,
    pub validation_results: Map<String, Value>,
    #[serde(default)]
    pub snapshot_metadata: Map<String, Value>,
    #[serde(default)]
    pub timestamp: Option<f64>,
}

impl ReportSubmission {
    /// Convert into a stored [`Report`], filling the timestamp with the
    /// server receive time when the client did not supply one.
    pub fn into_report(self, received_at: DateTime<Utc>) -> Report {
        Report {
            task_id: self.task_id,
            project_structure: self.project_structure,
            validation_results: self.validation_results,
            snapshot_metadata: self.snapshot_metadata,
            timestamp: self.timestamp.unwrap_or_else(|| epoch_seconds(received_at)),
        }
    }
}

/// A stored task report, served back verbatim on `GET /report/{task_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub task_id: String,
    pub project_structure: Map<String, Value>,
    pub validation_results: Map<String, Value>,
    pub snapshot_metadata: Map<String, Value>,
    pub timestamp: f64,
}

/// Response for a successful `POST /report`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoreReportResponse {
    pub status: String,
    pub task_id: String,
}

/// Response for `GET /report/list`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListReportsResponse {
    pub reports: Vec<String>,
}

// ============================================================================
// Snapshots
// ============================================================================

/// Response for a successful `POST /snapshot`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotStoredResponse {
    pub status: String,
    pub task_id: String,
    pub agent_id: Option<String>,
    pub size_bytes: u64,
    pub timestamp: f64,
}

/// Response for `GET /snapshot/{task_id}` when the blob is present.
#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotExistsResponse {
    pub exists: bool,
    pub task_id: String,
}

// ============================================================================
// Health
// ============================================================================

/// Response for `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub stored_reports: usize,
    pub valid_prefixes: Vec<String>,
}

// ============================================================================
// Time Helpers
// ============================================================================

/// Seconds since the Unix epoch as a float, microsecond precision.
pub fn epoch_seconds(t: DateTime<Utc>) -> f64 {
    t.timestamp_micros() as f64 / 1_000_000.0
}
