//! Folio Services Layer
//!
//! Orchestration on top of processing and storage: the upload pipeline that runs
//! each file through validation, transformation and storage, and the reconciler
//! that removes orphaned files. The API crate depends on this facade.

pub mod pipeline;
pub mod reconciler;

pub use pipeline::{
    BatchOutcome, BatchStatus, FileFailure, KindOutcome, KindResult, PipelineResult,
    ProcessedAsset, StoredDerivative, UploadPipeline,
};
pub use reconciler::{ReconcileReport, Reconciler};

pub use folio_processing::{AssetValidator, ImageTransformer, TransformError, ValidationError};
pub use folio_storage::{
    create_storage, AssetStore, Storage, StorageBackend, StorageError, StorageResult,
};
