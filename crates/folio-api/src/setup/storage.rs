//! Storage setup and initialization

use anyhow::{Context, Result};
use folio_core::Config;
use folio_storage::{create_storage, Storage};
use std::sync::Arc;

/// Build the one storage backend the process writes through.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!(backend = %config.storage_backend(), "Initializing storage...");

    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;

    storage
        .health_check()
        .await
        .context("Storage backend is not reachable")?;

    tracing::info!(
        backend = %storage.backend_type(),
        uploads_root = %config.uploads_root().display(),
        public_prefix = %config.public_uploads_prefix(),
        "Storage initialized successfully"
    );

    Ok(storage)
}
