//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Folio API",
        version = "0.1.0",
        description = "Image ingestion for a portfolio backend: validated uploads for project covers, project pictures, skill icons, avatars and experience photos, converted to WebP derivatives, plus keep-set cleanup of orphaned files."
    ),
    paths(
        // Uploads
        handlers::uploads::upload_cover,
        handlers::uploads::upload_pictures,
        handlers::uploads::upload_skill_icon,
        handlers::uploads::upload_avatar,
        handlers::uploads::upload_experience_photo,
        handlers::uploads::upload_project,
        // Maintenance
        handlers::cleanup::cleanup_orphans,
        handlers::health::health_check,
    ),
    components(schemas(
        error::ErrorResponse,
        handlers::uploads::CoverUrls,
        handlers::uploads::AssetMetadata,
        handlers::uploads::CoverUploadResponse,
        handlers::uploads::IconMetadata,
        handlers::uploads::IconUploadResponse,
        handlers::uploads::AvatarUploadResponse,
        handlers::uploads::ExperiencePhotoUploadResponse,
        handlers::uploads::PictureEntry,
        handlers::uploads::FileError,
        handlers::uploads::BatchMetadata,
        handlers::uploads::PicturesUploadResponse,
        handlers::uploads::ProjectMetadata,
        handlers::uploads::ProjectUploadResponse,
        handlers::cleanup::CleanupRequest,
        handlers::cleanup::CleanupData,
        handlers::cleanup::CleanupResponse,
        handlers::health::HealthCheckResponse,
    )),
    tags(
        (name = "uploads", description = "Image uploads and orphan cleanup"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
