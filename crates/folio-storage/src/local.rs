use crate::keys::{self, is_temp_file_name, temp_file_name, validate_key};
use crate::traits::{Storage, StorageError, StoredObject, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use folio_core::StoredAsset;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
    public_prefix: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Uploads root (e.g., "/var/lib/folio/uploads")
    /// * `public_prefix` - Path prefix under which files are referenced (e.g., "/uploads")
    pub async fn new(base_path: impl Into<PathBuf>, public_prefix: &str) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert storage key to filesystem path with security validation
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        validate_key(storage_key)?;

        let path = self.base_path.join(storage_key);

        // Symlinked directories could still lead outside the root.
        if let (Ok(base_canonical), Some(Ok(parent_canonical))) = (
            self.base_path.canonicalize(),
            path.parent().map(|p| p.canonicalize()),
        ) {
            if parent_canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    fn path_to_key(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.base_path).ok()?;
        let parts: Vec<&str> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()?;
        Some(parts.join("/"))
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn write_temp_then_rename(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StorageError::InvalidKey("Storage key has no file name".to_string()))?;
        let temp_path = path.with_file_name(temp_file_name(file_name));

        let result = async {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to create file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(data).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to write file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.sync_all().await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to sync file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            fs::rename(&temp_path, path).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to publish file {}: {}",
                    path.display(),
                    e
                ))
            })
        }
        .await;

        if result.is_err() {
            if let Err(e) = fs::remove_file(&temp_path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(
                        path = %temp_path.display(),
                        error = %e,
                        "Failed to remove temporary upload file"
                    );
                }
            }
        }

        result
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<StoredAsset> {
        let path = self.key_to_path(key)?;
        let size = data.len() as u64;

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        self.write_temp_then_rename(&path, &data).await?;

        let reference = self.reference_for_key(key);

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(StoredAsset::LocalFile {
            name: key.rsplit('/').next().unwrap_or(key).to_string(),
            key: key.to_string(),
            path,
            reference,
            size_bytes: size,
        })
    }

    async fn read(&self, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(key.to_string()));
        }

        fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn list(&self) -> StorageResult<Vec<StoredObject>> {
        match fs::metadata(&self.base_path).await {
            Ok(meta) if meta.is_dir() => {}
            _ => {
                return Err(StorageError::NotFound(
                    self.base_path.display().to_string(),
                ))
            }
        }

        let mut objects = Vec::new();
        let mut pending = vec![self.base_path.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %dir.display(), error = %e, "Failed to read directory");
                    continue;
                }
            };

            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(path = %dir.display(), error = %e, "Failed to read directory entry");
                        break;
                    }
                };

                let path = entry.path();
                let file_type = match entry.file_type().await {
                    Ok(file_type) => file_type,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to stat entry");
                        continue;
                    }
                };

                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }
                if !file_type.is_file() {
                    continue;
                }

                let is_temp = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(is_temp_file_name)
                    .unwrap_or(false);
                if is_temp {
                    continue;
                }

                let Some(key) = self.path_to_key(&path) else {
                    tracing::warn!(path = %path.display(), "Skipping file with non UTF-8 path");
                    continue;
                };

                let meta = entry.metadata().await.ok();
                objects.push(StoredObject {
                    key,
                    size_bytes: meta.as_ref().map(|m| m.len()).unwrap_or(0),
                    modified: meta.and_then(|m| m.modified().ok()),
                });
            }
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    async fn health_check(&self) -> StorageResult<()> {
        let meta = fs::metadata(&self.base_path).await?;
        if !meta.is_dir() {
            return Err(StorageError::NotFound(self.base_path.display().to_string()));
        }
        Ok(())
    }

    fn reference_for_key(&self, key: &str) -> String {
        format!("{}/{}", self.public_prefix, key)
    }

    fn key_for_reference(&self, reference: &str) -> Option<String> {
        let normalized = keys::normalize_reference(reference);
        let key = normalized
            .strip_prefix(&self.public_prefix)?
            .strip_prefix('/')?
            .to_string();
        validate_key(&key).ok()?;
        Some(key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
