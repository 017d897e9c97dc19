//! Snapshot upload, existence check, and download handlers.

use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::{Multipart, Path as PathExtract, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use tokio_util::io::ReaderStream;
use tracing::{error, info, warn};

use crate::api::{SnapshotExistsResponse, SnapshotStoredResponse, epoch_seconds};
use crate::handlers::problem_details;
use crate::server::AppState;

// ============================================================================
// Handlers
// ============================================================================

/// POST /snapshot
///
/// Multipart form upload: `file` (binary, required), `task_id` (required),
/// `agent_id` and `timestamp` (optional). The whole form is read before
/// validation because the fields may arrive in any order; nothing is written
/// to storage until the task identifier has passed the prefix check.
pub async fn upload_snapshot(State(state): State<AppState>, multipart: Multipart) -> Response {
    let form = match read_upload_form(multipart).await {
        Ok(f) => f,
        Err(detail) => return problem_details::bad_request(detail),
    };

    let Some(task_id) = form.task_id else {
        return problem_details::bad_request("missing task_id field");
    };
    let Some(file) = form.file else {
        return problem_details::bad_request("missing file field");
    };

    if !state.policy.is_allowed(&task_id) {
        warn!(task_id = %task_id, "Rejected snapshot with invalid task_id prefix");
        return problem_details::bad_request("invalid task_id prefix");
    }

    if let Err(e) = state.snapshots.put(&task_id, &file).await {
        error!(task_id = %task_id, error = %e, "Failed to store snapshot");
        return problem_details::internal_error("failed to store snapshot");
    }

    info!(task_id = %task_id, size_bytes = file.len(), "Snapshot stored");

    (
        StatusCode::OK,
        Json(SnapshotStoredResponse {
            status: "stored".to_string(),
            task_id,
            agent_id: form.agent_id,
            size_bytes: file.len() as u64,
            timestamp: form.timestamp.unwrap_or_else(|| epoch_seconds(Utc::now())),
        }),
    )
        .into_response()
}

/// GET /snapshot/{task_id}
pub async fn snapshot_exists(
    State(state): State<AppState>,
    PathExtract(task_id): PathExtract<String>,
) -> Response {
    if !state.snapshots.exists(&task_id).await {
        return problem_details::not_found("snapshot not found");
    }

    (
        StatusCode::OK,
        Json(SnapshotExistsResponse {
            exists: true,
            task_id,
        }),
    )
        .into_response()
}

/// GET /snapshot/download/{task_id}
///
/// Streams the blob as `application/octet-stream` with the filename
/// `{task_id}.snapshot`.
pub async fn download_snapshot(
    State(state): State<AppState>,
    PathExtract(task_id): PathExtract<String>,
) -> Response {
    let file = match state.snapshots.open(&task_id).await {
        Ok(Some(f)) => f,
        Ok(None) => return problem_details::not_found("snapshot not found"),
        Err(e) => {
            error!(task_id = %task_id, error = %e, "Failed to open snapshot");
            return problem_details::internal_error("failed to read snapshot");
        }
    };

    let disposition = format!("attachment; filename=\"{task_id}.snapshot\"");
    (
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response()
}

// ============================================================================
// Implementation Details
// ============================================================================

#[derive(Default)]
struct UploadForm {
    file: Option<Bytes>,
    task_id: Option<String>,
    agent_id: Option<String>,
    timestamp: Option<f64>,
}

/// Drain the multipart form into its known fields.
///
/// Unknown fields are skipped. Any multipart decode failure is reported as a
/// malformed body.
async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, String> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("invalid multipart body: {e}"))?
    {
        // Field name must outlive the consuming reads below.
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("file") => {
                form.file = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| format!("failed to read file field: {e}"))?,
                );
            }
            Some("task_id") => {
                form.task_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| format!("failed to read task_id field: {e}"))?,
                );
            }
            Some("agent_id") => {
                form.agent_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| format!("failed to read agent_id field: {e}"))?,
                );
            }
            Some("timestamp") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| format!("failed to read timestamp field: {e}"))?;
                form.timestamp =
                    Some(text.parse::<f64>().map_err(|e| {
                        format!("invalid timestamp field '{text}': {e}")
                    })?);
            }
            _ => {}
        }
    }

    Ok(form)
}
