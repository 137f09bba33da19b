//! Multipart upload handlers, one per asset kind plus the combined project form.

use std::sync::Arc;

use axum::{extract::Multipart, extract::State, http::StatusCode, Json};
use folio_core::{format_bytes, AppError, AssetKind, OutputFormat};
use folio_services::{BatchOutcome, FileFailure, KindOutcome, ProcessedAsset};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::multipart::{read_upload_request, single_file};

#[derive(Debug, Serialize, ToSchema)]
pub struct CoverUrls {
    pub small: String,
    pub large: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetMetadata {
    pub original_name: String,
    /// Human-readable size of the upload, e.g. `1.4 MB`
    pub original_size: String,
    /// Wall time spent transforming and storing, e.g. `182ms`
    pub processing_time: String,
    pub output_format: String,
    /// Derivative boxes, e.g. `["400x400", "1000x1000"]`
    pub sizes: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CoverUploadResponse {
    pub success: bool,
    pub message: String,
    pub cover: CoverUrls,
    pub metadata: AssetMetadata,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IconMetadata {
    pub original_name: String,
    pub original_size: String,
    pub processing_time: String,
    pub format: String,
    /// `false` when the file was stored as uploaded (SVG)
    pub optimized: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IconUploadResponse {
    pub success: bool,
    pub message: String,
    pub icon: String,
    pub metadata: IconMetadata,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AvatarUploadResponse {
    pub success: bool,
    pub message: String,
    pub avatar: String,
    pub metadata: AssetMetadata,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExperiencePhotoUploadResponse {
    pub success: bool,
    pub message: String,
    pub image: String,
    pub metadata: AssetMetadata,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PictureEntry {
    /// Original filename
    pub original: String,
    pub url: String,
    /// Human-readable size of the upload
    pub size: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FileError {
    pub filename: String,
    pub error: String,
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchMetadata {
    pub total_files: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub total_processing_time: String,
    pub output_format: String,
    pub size: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PicturesUploadResponse {
    /// `true` when at least one picture was stored
    pub success: bool,
    pub message: String,
    pub pictures: Vec<PictureEntry>,
    pub metadata: BatchMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FileError>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    pub total_files: usize,
    pub success_count: usize,
    pub error_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectUploadResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<CoverUrls>,
    pub pictures: Vec<PictureEntry>,
    pub metadata: ProjectMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FileError>>,
}

fn format_duration(duration: std::time::Duration) -> String {
    format!("{}ms", duration.as_millis())
}

fn asset_metadata(asset: &ProcessedAsset) -> AssetMetadata {
    AssetMetadata {
        original_name: asset.original_name.clone(),
        original_size: format_bytes(asset.original_size),
        processing_time: format_duration(asset.processing_time),
        output_format: asset.output_format.to_string(),
        sizes: asset
            .kind
            .policy()
            .derivatives
            .iter()
            .map(|d| d.size_label())
            .collect(),
    }
}

fn primary_reference(asset: &ProcessedAsset) -> Result<String, AppError> {
    asset
        .primary_reference()
        .map(String::from)
        .ok_or_else(|| AppError::Internal("Processed asset has no derivatives".to_string()))
}

fn cover_urls(asset: &ProcessedAsset) -> Result<CoverUrls, AppError> {
    let reference = |label: &str| {
        asset
            .derivative(label)
            .map(|d| d.asset.reference().to_string())
            .ok_or_else(|| AppError::Internal(format!("Cover is missing its {} derivative", label)))
    };
    Ok(CoverUrls {
        small: reference("small")?,
        large: reference("large")?,
    })
}

fn picture_entries(outcome: &BatchOutcome) -> Vec<PictureEntry> {
    outcome
        .processed
        .iter()
        .filter_map(|asset| {
            asset.primary_reference().map(|url| PictureEntry {
                original: asset.original_name.clone(),
                url: url.to_string(),
                size: format_bytes(asset.original_size),
            })
        })
        .collect()
}

fn file_errors(failures: &[FileFailure]) -> Option<Vec<FileError>> {
    if failures.is_empty() {
        return None;
    }
    Some(
        failures
            .iter()
            .map(|f| FileError {
                filename: f.file_name.clone(),
                error: f.reason.clone(),
                code: f.code.to_string(),
            })
            .collect(),
    )
}

/// Upload a project cover
///
/// One image in, two square WebP derivatives out (`small` 400x400, `large` 1000x1000).
/// Either both are stored or neither is.
#[utoipa::path(
    post,
    path = "/api/upload/project-cover",
    tag = "uploads",
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "Field `cover`: one JPEG, PNG or WebP image, at most 10 MB"),
    responses(
        (status = 200, description = "Cover uploaded", body = CoverUploadResponse),
        (status = 400, description = "Missing or invalid file", body = ErrorResponse),
        (status = 500, description = "Processing or storage failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_cover"))]
pub async fn upload_cover(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<CoverUploadResponse>, HttpAppError> {
    let request = read_upload_request(multipart, &[AssetKind::Cover]).await?;
    let file = single_file(&request, AssetKind::Cover)?;

    let asset = state
        .pipeline
        .process_single(AssetKind::Cover, file)
        .await?;

    Ok(Json(CoverUploadResponse {
        success: true,
        message: "Cover uploaded successfully".to_string(),
        cover: cover_urls(&asset)?,
        metadata: asset_metadata(&asset),
    }))
}

/// Upload project pictures
///
/// Each picture is validated and processed on its own. The status is 200 when all
/// succeed, 207 when some do and 400 when none do.
#[utoipa::path(
    post,
    path = "/api/upload/project-pictures",
    tag = "uploads",
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "Repeated field `pictures`: up to 10 JPEG, PNG or WebP images, 10 MB each"),
    responses(
        (status = 200, description = "All pictures uploaded", body = PicturesUploadResponse),
        (status = 207, description = "Some pictures uploaded", body = PicturesUploadResponse),
        (status = 400, description = "No picture uploaded", body = PicturesUploadResponse),
        (status = 500, description = "Unexpected failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_pictures"))]
pub async fn upload_pictures(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PicturesUploadResponse>), HttpAppError> {
    let request = read_upload_request(multipart, &[AssetKind::Picture]).await?;
    let files = request.files_for(AssetKind::Picture);
    if files.is_empty() {
        return Err(AppError::NoFile("No picture files provided".to_string()).into());
    }

    let outcome = state.pipeline.process_batch(AssetKind::Picture, files).await;
    let status = StatusCode::from_u16(outcome.status().http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let full = AssetKind::Picture.policy().derivatives.first();
    let response = PicturesUploadResponse {
        success: outcome.success_count() > 0,
        message: format!(
            "{}/{} image(s) uploaded",
            outcome.success_count(),
            outcome.total_files
        ),
        pictures: picture_entries(&outcome),
        metadata: BatchMetadata {
            total_files: outcome.total_files,
            success_count: outcome.success_count(),
            error_count: outcome.error_count(),
            total_processing_time: format_duration(outcome.total_processing_time),
            output_format: OutputFormat::WebP.to_string(),
            size: full.map(|d| d.size_label()).unwrap_or_default(),
        },
        errors: file_errors(&outcome.failures),
    };

    Ok((status, Json(response)))
}

/// Upload a skill icon
///
/// SVG is stored as uploaded; raster icons are fitted into 512x512 and stored as WebP.
#[utoipa::path(
    post,
    path = "/api/upload/skill-icon",
    tag = "uploads",
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "Field `icon`: one SVG, PNG, JPEG or WebP file, at most 2 MB"),
    responses(
        (status = 200, description = "Icon uploaded", body = IconUploadResponse),
        (status = 400, description = "Missing or invalid file", body = ErrorResponse),
        (status = 500, description = "Processing or storage failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_icon"))]
pub async fn upload_skill_icon(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<IconUploadResponse>, HttpAppError> {
    let request = read_upload_request(multipart, &[AssetKind::Icon]).await?;
    let file = single_file(&request, AssetKind::Icon)?;

    let asset = state.pipeline.process_single(AssetKind::Icon, file).await?;

    Ok(Json(IconUploadResponse {
        success: true,
        message: "Icon uploaded successfully".to_string(),
        icon: primary_reference(&asset)?,
        metadata: IconMetadata {
            original_name: asset.original_name.clone(),
            original_size: format_bytes(asset.original_size),
            processing_time: format_duration(asset.processing_time),
            format: asset.output_format.to_string(),
            optimized: asset.output_format != OutputFormat::Svg,
        },
    }))
}

/// Upload a profile avatar
#[utoipa::path(
    post,
    path = "/api/upload/avatar",
    tag = "uploads",
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "Field `avatar`: one JPEG, PNG, GIF or WebP image, at most 5 MB"),
    responses(
        (status = 200, description = "Avatar uploaded", body = AvatarUploadResponse),
        (status = 400, description = "Missing or invalid file", body = ErrorResponse),
        (status = 500, description = "Processing or storage failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_avatar"))]
pub async fn upload_avatar(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<AvatarUploadResponse>, HttpAppError> {
    let request = read_upload_request(multipart, &[AssetKind::Avatar]).await?;
    let file = single_file(&request, AssetKind::Avatar)?;

    let asset = state
        .pipeline
        .process_single(AssetKind::Avatar, file)
        .await?;

    Ok(Json(AvatarUploadResponse {
        success: true,
        message: "Avatar uploaded successfully".to_string(),
        avatar: primary_reference(&asset)?,
        metadata: asset_metadata(&asset),
    }))
}

/// Upload an experience photo
#[utoipa::path(
    post,
    path = "/api/upload/experience-photo",
    tag = "uploads",
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "Field `image`: one JPEG, PNG or WebP image, at most 5 MB"),
    responses(
        (status = 200, description = "Photo uploaded", body = ExperiencePhotoUploadResponse),
        (status = 400, description = "Missing or invalid file", body = ErrorResponse),
        (status = 500, description = "Processing or storage failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_experience_photo"))]
pub async fn upload_experience_photo(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ExperiencePhotoUploadResponse>, HttpAppError> {
    let request = read_upload_request(multipart, &[AssetKind::ExperiencePhoto]).await?;
    let file = single_file(&request, AssetKind::ExperiencePhoto)?;

    let asset = state
        .pipeline
        .process_single(AssetKind::ExperiencePhoto, file)
        .await?;

    Ok(Json(ExperiencePhotoUploadResponse {
        success: true,
        message: "Photo uploaded successfully".to_string(),
        image: primary_reference(&asset)?,
        metadata: asset_metadata(&asset),
    }))
}

/// Upload a cover and pictures from one project form
///
/// Each kind is processed independently; the status follows the same 200/207/400
/// rule as the picture batch, counted over all files.
#[utoipa::path(
    post,
    path = "/api/upload/project",
    tag = "uploads",
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "Optional field `cover` plus repeated field `pictures`"),
    responses(
        (status = 200, description = "Everything uploaded", body = ProjectUploadResponse),
        (status = 207, description = "Some files uploaded", body = ProjectUploadResponse),
        (status = 400, description = "Nothing uploaded", body = ErrorResponse),
        (status = 500, description = "Unexpected failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_project"))]
pub async fn upload_project(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ProjectUploadResponse>), HttpAppError> {
    let request =
        read_upload_request(multipart, &[AssetKind::Cover, AssetKind::Picture]).await?;

    let result = state.pipeline.process(request).await?;
    let status = StatusCode::from_u16(result.status().http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let cover = match result.get(AssetKind::Cover) {
        Some(KindOutcome::Single(Ok(asset))) => Some(cover_urls(asset)?),
        _ => None,
    };
    let pictures = match result.get(AssetKind::Picture) {
        Some(KindOutcome::Batch(outcome)) => picture_entries(outcome),
        _ => Vec::new(),
    };
    let failures = result.failures();

    let response = ProjectUploadResponse {
        success: result.success_count() > 0,
        message: format!(
            "{}/{} file(s) uploaded",
            result.success_count(),
            result.total_files()
        ),
        cover,
        pictures,
        metadata: ProjectMetadata {
            total_files: result.total_files(),
            success_count: result.success_count(),
            error_count: failures.len(),
        },
        errors: file_errors(&failures),
    };

    Ok((status, Json(response)))
}
