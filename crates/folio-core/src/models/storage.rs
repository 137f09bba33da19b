use serde::Serialize;
use std::path::{Path, PathBuf};

/// Persisted identity of one derivative.
///
/// The reference is the only form handed to owning records: a path under the public
/// uploads prefix for local files, an absolute URL for remote objects. The key is the
/// backend-internal identifier used for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "backend", rename_all = "camelCase")]
pub enum StoredAsset {
    #[serde(rename = "local", rename_all = "camelCase")]
    LocalFile {
        name: String,
        key: String,
        path: PathBuf,
        reference: String,
        size_bytes: u64,
    },
    #[serde(rename = "remote", rename_all = "camelCase")]
    RemoteFile {
        name: String,
        key: String,
        bucket: String,
        url: String,
        size_bytes: u64,
    },
}

impl StoredAsset {
    pub fn reference(&self) -> &str {
        match self {
            StoredAsset::LocalFile { reference, .. } => reference,
            StoredAsset::RemoteFile { url, .. } => url,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            StoredAsset::LocalFile { key, .. } | StoredAsset::RemoteFile { key, .. } => key,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            StoredAsset::LocalFile { name, .. } | StoredAsset::RemoteFile { name, .. } => name,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        match self {
            StoredAsset::LocalFile { size_bytes, .. }
            | StoredAsset::RemoteFile { size_bytes, .. } => *size_bytes,
        }
    }

    /// Filesystem location, for local files only.
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            StoredAsset::LocalFile { path, .. } => Some(path),
            StoredAsset::RemoteFile { .. } => None,
        }
    }
}
