//! Route configuration and setup

use crate::api_doc;
use crate::constants::{HEALTH_PATH, HTTP_CONCURRENCY_LIMIT, OPENAPI_PATH, UPLOAD_PREFIX};
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use folio_core::{Config, StorageBackend};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let mut app = Router::new()
        .route(HEALTH_PATH, get(handlers::health::health_check))
        .route(
            OPENAPI_PATH,
            get(|| async { Json(api_doc::get_openapi_spec()) }),
        )
        .nest(UPLOAD_PREFIX, upload_routes())
        .with_state(state);

    // Local derivatives are served read-only from the uploads root
    if config.storage_backend() == StorageBackend::Local {
        tracing::info!(
            prefix = %config.public_uploads_prefix(),
            root = %config.uploads_root().display(),
            "Serving local uploads"
        );
        app = app.nest_service(
            config.public_uploads_prefix(),
            ServeDir::new(config.uploads_root()),
        );
    }

    let app = app
        .layer(ConcurrencyLimitLayer::new(HTTP_CONCURRENCY_LIMIT))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_request_body_bytes()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

fn upload_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/project-cover", post(handlers::uploads::upload_cover))
        .route("/project-pictures", post(handlers::uploads::upload_pictures))
        .route("/skill-icon", post(handlers::uploads::upload_skill_icon))
        .route("/avatar", post(handlers::uploads::upload_avatar))
        .route(
            "/experience-photo",
            post(handlers::uploads::upload_experience_photo),
        )
        .route("/project", post(handlers::uploads::upload_project))
        .route("/cleanup", post(handlers::cleanup::cleanup_orphans))
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        if config.is_production() {
            tracing::warn!("CORS configured to allow all origins - not recommended for production");
        }
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}
