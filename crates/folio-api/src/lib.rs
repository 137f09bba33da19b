//! Folio API Library
//!
//! HTTP surface of the upload pipeline: multipart upload endpoints per asset kind,
//! the cleanup endpoint, health, OpenAPI and static serving of local uploads.

mod api_doc;
pub mod constants;
mod handlers;
pub mod setup;
mod telemetry;
mod utils;

// Public modules
pub mod error;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
