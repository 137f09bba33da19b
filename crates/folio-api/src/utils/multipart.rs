//! Multipart extraction for upload handlers

use axum::extract::Multipart;
use folio_core::{AppError, AssetKind, UploadRequest, UploadedFile};

/// Form field name without a trailing `[]` (`pictures[]` and `pictures` are the same slot).
pub fn normalize_field_name(name: &str) -> &str {
    name.trim().trim_end_matches("[]")
}

/// Read every file part of `multipart` into memory.
///
/// Only fields belonging to `accepted` kinds are allowed; any other file field is
/// rejected. Non-file fields are ignored.
pub async fn read_upload_request(
    mut multipart: Multipart,
    accepted: &[AssetKind],
) -> Result<UploadRequest, AppError> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read multipart: {}", e.body_text())))?
    {
        let raw_name = field.name().map(|s| s.to_string()).unwrap_or_default();
        let field_name = normalize_field_name(&raw_name).to_string();

        let Some(file_name) = field.file_name().map(|s| s.to_string()) else {
            tracing::debug!(field = %field_name, "Ignoring non-file multipart field");
            continue;
        };

        let known = AssetKind::from_field_name(&field_name)
            .map(|kind| accepted.contains(&kind))
            .unwrap_or(false);
        if !known {
            return Err(AppError::BadRequest(format!(
                "Unexpected file field: {}",
                field_name
            )));
        }

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let data = field.bytes().await.map_err(|e| {
            AppError::BadRequest(format!("Failed to read file data: {}", e.body_text()))
        })?;

        tracing::debug!(
            field = %field_name,
            file_name = %file_name,
            content_type = %content_type,
            size_bytes = data.len(),
            "Received file"
        );

        files.push(UploadedFile::new(field_name, file_name, content_type, data));
    }

    Ok(UploadRequest::new(files))
}

/// The one file a single-file kind expects.
pub fn single_file(request: &UploadRequest, kind: AssetKind) -> Result<UploadedFile, AppError> {
    let mut files = request.files_for(kind);
    match files.len() {
        0 => Err(AppError::NoFile(format!(
            "No {} file provided",
            kind.field_name()
        ))),
        1 => Ok(files.remove(0)),
        count => Err(AppError::TooManyFiles {
            count,
            max: kind.policy().max_file_count,
        }),
    }
}
