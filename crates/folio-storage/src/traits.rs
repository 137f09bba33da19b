//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use folio_core::{AppError, StoredAsset};
use std::time::SystemTime;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// One object found while listing the uploads root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Key relative to the uploads root, `/`-separated
    pub key: String,
    pub size_bytes: u64,
    pub modified: Option<SystemTime>,
}

/// Storage abstraction trait
///
/// Keys are relative to the uploads root and `/`-separated, e.g.
/// `projects/covers/cover-<token>-small.webp`. Each backend owns the mapping between
/// keys and the references handed out to callers, so that mapping lives in exactly
/// one place.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Persist `data` under `key`. The object is either fully visible or absent.
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str)
        -> StorageResult<StoredAsset>;

    /// Read an object back by key
    async fn read(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Delete an object by key. Deleting a missing object is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Recursively list every object under the uploads root.
    ///
    /// Fails with [`StorageError::NotFound`] when the root itself is missing.
    async fn list(&self) -> StorageResult<Vec<StoredObject>>;

    /// Cheap reachability probe used by the health endpoint
    async fn health_check(&self) -> StorageResult<()>;

    /// Externally reachable reference for a key
    fn reference_for_key(&self, key: &str) -> String;

    /// Inverse of [`Storage::reference_for_key`]; `None` for references this backend
    /// did not issue.
    fn key_for_reference(&self, reference: &str) -> Option<String>;

    fn backend_type(&self) -> StorageBackend;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_maps_to_app_error() {
        let err: AppError = StorageError::NotFound("public/uploads".to_string()).into();
        assert!(matches!(err, AppError::NotFound(_)));

        let err: AppError = StorageError::UploadFailed("disk full".to_string()).into();
        assert!(matches!(err, AppError::Storage(ref msg) if msg.contains("disk full")));
    }
}
