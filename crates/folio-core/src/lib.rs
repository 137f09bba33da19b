//! Folio Core Library
//!
//! Domain models, error types and configuration shared by the storage, processing,
//! services and API crates.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod units;

// Re-export commonly used types
pub use config::{BaseConfig, Config, UploadConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    AssetKind, AssetPolicy, DerivativeSpec, FitMode, OutputFormat, StoredAsset, UploadRequest,
    UploadedFile, MIB, MIME_SVG,
};
pub use storage_types::StorageBackend;
pub use units::format_bytes;
