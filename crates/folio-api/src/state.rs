//! Application state shared by all handlers.

use folio_core::Config;
use folio_services::{AssetStore, Reconciler, Storage, UploadPipeline};
use std::sync::Arc;

/// Everything a handler needs, built once at startup around one storage backend.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    pub pipeline: UploadPipeline,
    pub reconciler: Reconciler,
}

impl AppState {
    pub fn new(config: Config, storage: Arc<dyn Storage>) -> Self {
        let store = AssetStore::new(storage.clone());
        let pipeline = UploadPipeline::new(store, config.picture_concurrency());
        let reconciler = Reconciler::new(storage.clone(), config.cleanup_grace_period());

        Self {
            config,
            storage,
            pipeline,
            reconciler,
        }
    }
}
