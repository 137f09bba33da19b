//! Store: names, writes and removes derivatives on the injected backend.

use crate::keys::{asset_file_name, asset_key};
use crate::traits::{Storage, StorageError, StorageResult};
use folio_core::{AssetKind, OutputFormat, StoredAsset};
use std::sync::Arc;

/// Storage client handed to the pipeline and reconciler.
///
/// Built once at startup around a configured backend; there is no global instance.
#[derive(Clone)]
pub struct AssetStore {
    backend: Arc<dyn Storage>,
}

impl AssetStore {
    pub fn new(backend: Arc<dyn Storage>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn Storage> {
        &self.backend
    }

    /// Persist one derivative as `{kind_dir}/{kind}-{base_name}-{label}.{ext}`.
    #[tracing::instrument(skip(self, data), fields(kind = %kind, size_bytes = data.len()))]
    pub async fn store(
        &self,
        data: Vec<u8>,
        kind: AssetKind,
        base_name: &str,
        label: &str,
        format: OutputFormat,
    ) -> StorageResult<StoredAsset> {
        let file_name = asset_file_name(kind, base_name, label, format.extension());
        let key = asset_key(kind, &file_name);
        self.backend.put(&key, data, format.mime_type()).await
    }

    pub async fn remove(&self, asset: &StoredAsset) -> StorageResult<()> {
        self.backend.delete(asset.key()).await
    }

    /// Best-effort rollback of already stored derivatives. Returns how many were removed.
    pub async fn remove_all(&self, assets: &[StoredAsset]) -> usize {
        let mut removed = 0;
        for asset in assets {
            match self.remove(asset).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        key = %asset.key(),
                        "Failed to roll back stored derivative"
                    );
                }
            }
        }
        removed
    }

    /// Fetch the bytes behind a reference this store issued.
    pub async fn resolve(&self, reference: &str) -> StorageResult<Vec<u8>> {
        let key = self
            .backend
            .key_for_reference(reference)
            .ok_or_else(|| StorageError::InvalidKey(format!("Unknown reference: {}", reference)))?;
        self.backend.read(&key).await
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use crate::LocalStorage;
    use tempfile::tempdir;

    async fn local_store(dir: &std::path::Path) -> AssetStore {
        let storage = LocalStorage::new(dir, "/uploads").await.unwrap();
        AssetStore::new(Arc::new(storage))
    }

    #[tokio::test]
    async fn test_store_names_by_kind_token_and_label() {
        let dir = tempdir().unwrap();
        let store = local_store(dir.path()).await;

        let asset = store
            .store(vec![1, 2, 3], AssetKind::Cover, "abc123", "small", OutputFormat::WebP)
            .await
            .unwrap();

        assert_eq!(asset.key(), "projects/covers/cover-abc123-small.webp");
        assert_eq!(
            asset.reference(),
            "/uploads/projects/covers/cover-abc123-small.webp"
        );
        assert_eq!(store.resolve(asset.reference()).await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_remove_all_rolls_back() {
        let dir = tempdir().unwrap();
        let store = local_store(dir.path()).await;

        let a = store
            .store(vec![1], AssetKind::Cover, "t", "small", OutputFormat::WebP)
            .await
            .unwrap();
        let b = store
            .store(vec![2], AssetKind::Cover, "t", "large", OutputFormat::WebP)
            .await
            .unwrap();

        assert_eq!(store.remove_all(&[a.clone(), b.clone()]).await, 2);
        assert!(!store.backend().exists(a.key()).await.unwrap());
        assert!(!store.backend().exists(b.key()).await.unwrap());
    }

    #[tokio::test]
    async fn test_resolve_rejects_foreign_reference() {
        let dir = tempdir().unwrap();
        let store = local_store(dir.path()).await;

        let result = store.resolve("https://elsewhere.example.com/a.webp").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }
}
