//! Orphan cleanup endpoint

use std::sync::Arc;

use axum::{body::Bytes, extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CleanupRequest {
    /// References still owned by a record; everything else under the uploads root is deleted
    #[serde(default)]
    pub files_to_keep: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CleanupData {
    pub deleted_files: Vec<String>,
    pub kept_files: Vec<String>,
    pub failed_files: Vec<String>,
    pub skipped_recent: Vec<String>,
    pub total_deleted: usize,
    pub total_kept: usize,
    pub bytes_freed: u64,
    /// Human-readable freed size, e.g. `1.5 MB`
    pub space_freed: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CleanupResponse {
    pub success: bool,
    pub message: String,
    pub data: CleanupData,
}

/// Delete unreferenced uploads
///
/// Walks the uploads root and deletes every file whose reference is not in
/// `filesToKeep`. A missing or empty body means an empty keep set.
#[utoipa::path(
    post,
    path = "/api/upload/cleanup",
    tag = "uploads",
    request_body(content = CleanupRequest, content_type = "application/json"),
    responses(
        (status = 200, description = "Cleanup completed", body = CleanupResponse),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 500, description = "Uploads directory not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, body), fields(operation = "cleanup"))]
pub async fn cleanup_orphans(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<CleanupResponse>, HttpAppError> {
    let request: CleanupRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CleanupRequest::default()
    } else {
        serde_json::from_slice(&body)?
    };

    let report = state.reconciler.reconcile(&request.files_to_keep).await?;

    Ok(Json(CleanupResponse {
        success: true,
        message: format!(
            "Cleanup completed: {} file(s) deleted, {} kept",
            report.total_deleted(),
            report.total_kept()
        ),
        data: CleanupData {
            total_deleted: report.total_deleted(),
            total_kept: report.total_kept(),
            space_freed: report.space_freed(),
            bytes_freed: report.bytes_freed,
            deleted_files: report.deleted_files,
            kept_files: report.kept_files,
            failed_files: report.failed_files,
            skipped_recent: report.skipped_recent,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_request_defaults_to_empty_keep_set() {
        let request: CleanupRequest = serde_json::from_str("{}").unwrap();
        assert!(request.files_to_keep.is_empty());

        let request: CleanupRequest =
            serde_json::from_str(r#"{"filesToKeep": ["/uploads/skills/a.svg"]}"#).unwrap();
        assert_eq!(request.files_to_keep, vec!["/uploads/skills/a.svg"]);
    }
}
