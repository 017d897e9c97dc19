//! Report ingestion and retrieval handlers.

use std::io::Read;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path as PathExtract, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use flate2::read::GzDecoder;
use serde::Deserialize;
use tracing::{info, warn};

use crate::api::{ListReportsResponse, ReportSubmission, StoreReportResponse};
use crate::handlers::problem_details;
use crate::server::AppState;

// ============================================================================
// Query Types
// ============================================================================

#[derive(Deserialize)]
pub struct ListReportsQuery {
    prefix: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /report
///
/// Accepts a JSON report body, optionally gzip-compressed
/// (`Content-Encoding: gzip`). The body is decompressed and parsed before
/// the task identifier is checked, matching the wire contract: a malformed
/// body and an invalid prefix both yield 400, and neither mutates the store.
pub async fn submit_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let decoded = match decode_body(&headers, body) {
        Ok(b) => b,
        Err(detail) => return problem_details::bad_request(detail),
    };

    let submission: ReportSubmission = match serde_json::from_slice(&decoded) {
        Ok(s) => s,
        Err(e) => {
            return problem_details::bad_request(format!("invalid report body: {e}"));
        }
    };

    if !state.policy.is_allowed(&submission.task_id) {
        warn!(task_id = %submission.task_id, "Rejected report with invalid task_id prefix");
        return problem_details::bad_request("invalid task_id prefix");
    }

    let task_id = submission.task_id.clone();
    state.reports.put(submission.into_report(Utc::now()));
    info!(task_id = %task_id, "Report stored");

    (
        StatusCode::OK,
        Json(StoreReportResponse {
            status: "stored".to_string(),
            task_id,
        }),
    )
        .into_response()
}

/// GET /report/{task_id}
pub async fn get_report(
    State(state): State<AppState>,
    PathExtract(task_id): PathExtract<String>,
) -> Response {
    let Some(report) = state.reports.get(&task_id) else {
        return problem_details::not_found("report not found");
    };

    (StatusCode::OK, Json(report)).into_response()
}

/// GET /report/list?prefix=
pub async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<ListReportsQuery>,
) -> Json<ListReportsResponse> {
    let reports = state.reports.list(query.prefix.as_deref());
    Json(ListReportsResponse { reports })
}

// ============================================================================
// Implementation Details
// ============================================================================

/// Transparently decompress a gzip-encoded request body.
fn decode_body(headers: &HeaderMap, body: Bytes) -> Result<Bytes, String> {
    let is_gzip = headers
        .get(header::CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("gzip"));

    if !is_gzip {
        return Ok(body);
    }

    let mut decoded = Vec::new();
    GzDecoder::new(body.as_ref())
        .read_to_end(&mut decoded)
        .map_err(|e| format!("invalid gzip body: {e}"))?;
    Ok(decoded.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn decode_body_passes_plain_bodies_through() {
        let headers = HeaderMap::new();
        let body = Bytes::from_static(b"{}");
        assert_eq!(decode_body(&headers, body).unwrap(), "{}");
    }

    #[test]
    fn decode_body_decompresses_gzip() {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(b"{\"key\":1}").unwrap();
        let compressed = encoder.finish().unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_ENCODING, "gzip".parse().unwrap());

        let decoded = decode_body(&headers, compressed.into()).unwrap();
        assert_eq!(decoded, "{\"key\":1}");
    }

    #[test]
    fn decode_body_rejects_corrupt_gzip() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_ENCODING, "gzip".parse().unwrap());

        let result = decode_body(&headers, Bytes::from_static(b"not gzip at all"));
        assert!(result.is_err());
    }
}
