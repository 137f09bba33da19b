//! Folio Storage Library
//!
//! Storage abstraction and backends for uploaded derivatives, plus the
//! [`AssetStore`] client the pipeline writes through.
//!
//! # Key format
//!
//! Keys are relative to the uploads root: `{kind_dir}/{kind}-{token}-{label}.{ext}`,
//! for example `projects/covers/cover-3f2a...-small.webp`. Keys must not contain `..`,
//! backslashes or a leading `/`. Key generation is centralized in the `keys` module
//! so all backends stay consistent.

pub mod asset_store;
pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use asset_store::AssetStore;
pub use factory::create_storage;
pub use folio_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult, StoredObject};
