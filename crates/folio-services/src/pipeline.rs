//! Upload pipeline: Validator -> Transformer -> Store, per asset kind.

use folio_core::{
    AppError, AssetKind, ErrorMetadata, OutputFormat, StoredAsset, UploadRequest, UploadedFile,
    MIME_SVG,
};
use folio_processing::{AssetValidator, Derivative, ImageTransformer, ValidationError};
use folio_storage::keys::generate_base_name;
use folio_storage::AssetStore;
use futures::stream::{self, StreamExt};
use std::time::{Duration, Instant};

/// One derivative after it has been written.
#[derive(Debug, Clone)]
pub struct StoredDerivative {
    pub label: &'static str,
    pub dimensions: Option<(u32, u32)>,
    pub asset: StoredAsset,
}

/// A file that made it through every stage.
#[derive(Debug, Clone)]
pub struct ProcessedAsset {
    pub kind: AssetKind,
    pub original_name: String,
    pub original_size: u64,
    pub output_format: OutputFormat,
    pub derivatives: Vec<StoredDerivative>,
    pub processing_time: Duration,
}

impl ProcessedAsset {
    pub fn derivative(&self, label: &str) -> Option<&StoredDerivative> {
        self.derivatives.iter().find(|d| d.label == label)
    }

    /// Reference of the first derivative; single-output kinds have only that one.
    pub fn primary_reference(&self) -> Option<&str> {
        self.derivatives.first().map(|d| d.asset.reference())
    }

    pub fn stored_bytes(&self) -> u64 {
        self.derivatives.iter().map(|d| d.asset.size_bytes()).sum()
    }
}

/// A file that was rejected or failed, with the reason reported to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub file_name: String,
    pub reason: String,
    pub code: &'static str,
}

impl FileFailure {
    fn new(file_name: impl Into<String>, err: &AppError) -> Self {
        Self {
            file_name: file_name.into(),
            reason: err.client_message(),
            code: err.error_code(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Full,
    Partial,
    Failed,
}

impl BatchStatus {
    pub fn from_counts(success_count: usize, total: usize) -> Self {
        if total > 0 && success_count == total {
            BatchStatus::Full
        } else if success_count > 0 {
            BatchStatus::Partial
        } else {
            BatchStatus::Failed
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            BatchStatus::Full => 200,
            BatchStatus::Partial => 207,
            BatchStatus::Failed => 400,
        }
    }
}

/// Result of a multi-file kind. Successes keep input order.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub kind: AssetKind,
    pub total_files: usize,
    pub processed: Vec<ProcessedAsset>,
    pub failures: Vec<FileFailure>,
    pub total_processing_time: Duration,
}

impl BatchOutcome {
    pub fn success_count(&self) -> usize {
        self.processed.len()
    }

    pub fn error_count(&self) -> usize {
        self.failures.len()
    }

    pub fn status(&self) -> BatchStatus {
        BatchStatus::from_counts(self.success_count(), self.total_files)
    }
}

#[derive(Debug)]
pub enum KindOutcome {
    Single(Result<ProcessedAsset, AppError>),
    Batch(BatchOutcome),
}

#[derive(Debug)]
pub struct KindResult {
    pub kind: AssetKind,
    /// Files submitted under this kind's field
    pub file_count: usize,
    pub outcome: KindOutcome,
}

/// Outcome of a whole upload request, one entry per kind present.
#[derive(Debug, Default)]
pub struct PipelineResult {
    pub results: Vec<KindResult>,
}

impl PipelineResult {
    pub fn get(&self, kind: AssetKind) -> Option<&KindOutcome> {
        self.results
            .iter()
            .find(|r| r.kind == kind)
            .map(|r| &r.outcome)
    }

    /// Every failed file across kinds.
    pub fn failures(&self) -> Vec<FileFailure> {
        let mut failures = Vec::new();
        for result in &self.results {
            match &result.outcome {
                KindOutcome::Single(Err(err)) => {
                    failures.push(FileFailure::new(result.kind.field_name(), err))
                }
                KindOutcome::Single(Ok(_)) => {}
                KindOutcome::Batch(batch) => failures.extend(batch.failures.iter().cloned()),
            }
        }
        failures
    }

    pub fn success_count(&self) -> usize {
        self.results
            .iter()
            .map(|r| match &r.outcome {
                KindOutcome::Single(Ok(_)) => 1,
                KindOutcome::Single(Err(_)) => 0,
                KindOutcome::Batch(batch) => batch.success_count(),
            })
            .sum()
    }

    pub fn total_files(&self) -> usize {
        self.results
            .iter()
            .map(|r| match &r.outcome {
                KindOutcome::Single(_) => r.file_count,
                KindOutcome::Batch(batch) => batch.total_files,
            })
            .sum()
    }

    pub fn status(&self) -> BatchStatus {
        BatchStatus::from_counts(self.success_count(), self.total_files())
    }
}

/// Runs uploads through validation, transformation and storage.
#[derive(Clone)]
pub struct UploadPipeline {
    store: AssetStore,
    picture_concurrency: usize,
}

impl UploadPipeline {
    pub fn new(store: AssetStore, picture_concurrency: usize) -> Self {
        Self {
            store,
            picture_concurrency: picture_concurrency.max(1),
        }
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    /// Process one file of `kind`. All derivatives are stored or none are.
    #[tracing::instrument(skip(self, file), fields(kind = %kind, file_name = %file.file_name, size_bytes = file.size()))]
    pub async fn process_single(
        &self,
        kind: AssetKind,
        file: UploadedFile,
    ) -> Result<ProcessedAsset, AppError> {
        let policy = kind.policy();
        let content_type = AssetValidator::new(policy).validate(&file)?;

        let start = Instant::now();

        if content_type != MIME_SVG {
            match ImageTransformer::probe(&file.data) {
                Ok(info) => tracing::debug!(
                    format = %info.format,
                    width = info.width,
                    height = info.height,
                    "Probed source image"
                ),
                Err(e) => tracing::debug!(error = %e, "Could not probe source image"),
            }
        }

        let derivatives =
            ImageTransformer::transform_async(file.data.clone(), content_type, policy).await?;
        let output_format = derivatives
            .first()
            .map(|d| d.format)
            .unwrap_or(policy.output_format);

        let stored = self.store_all(kind, derivatives).await?;
        let processing_time = start.elapsed();

        tracing::info!(
            derivatives = stored.len(),
            duration_ms = processing_time.as_millis() as u64,
            "Asset processed"
        );

        Ok(ProcessedAsset {
            kind,
            original_name: file.file_name,
            original_size: file.data.len() as u64,
            output_format,
            derivatives: stored,
            processing_time,
        })
    }

    /// Process independent files of a multi-file kind with bounded concurrency.
    #[tracing::instrument(skip(self, files), fields(kind = %kind, total_files = files.len()))]
    pub async fn process_batch(&self, kind: AssetKind, files: Vec<UploadedFile>) -> BatchOutcome {
        let start = Instant::now();
        let total_files = files.len();
        let (admitted, rejected) = AssetValidator::for_kind(kind).partition_batch(files);

        let results: Vec<(String, Result<ProcessedAsset, AppError>)> = stream::iter(admitted)
            .map(|file| async move {
                let file_name = file.file_name.clone();
                (file_name, self.process_single(kind, file).await)
            })
            .buffered(self.picture_concurrency)
            .collect()
            .await;

        let mut processed = Vec::new();
        let mut failures = Vec::new();
        for (file_name, result) in results {
            match result {
                Ok(asset) => processed.push(asset),
                Err(err) => {
                    tracing::warn!(file_name = %file_name, error = %err, "File failed in batch");
                    failures.push(FileFailure::new(file_name, &err));
                }
            }
        }
        for (file, err) in rejected {
            let err = AppError::from(err);
            failures.push(FileFailure::new(file.file_name, &err));
        }

        let outcome = BatchOutcome {
            kind,
            total_files,
            processed,
            failures,
            total_processing_time: start.elapsed(),
        };

        tracing::info!(
            success_count = outcome.success_count(),
            error_count = outcome.error_count(),
            duration_ms = outcome.total_processing_time.as_millis() as u64,
            "Batch processed"
        );

        outcome
    }

    /// Dispatch every kind present in `request`.
    pub async fn process(&self, request: UploadRequest) -> Result<PipelineResult, AppError> {
        if request.is_empty() {
            return Err(AppError::NoFile("No file provided".to_string()));
        }

        let mut result = PipelineResult::default();
        for kind in request.kinds() {
            let mut files = request.files_for(kind);
            let file_count = files.len();
            let outcome = if kind.is_batch() {
                KindOutcome::Batch(self.process_batch(kind, files).await)
            } else if files.len() > 1 {
                KindOutcome::Single(Err(ValidationError::TooManyFiles {
                    position: files.len(),
                    max: kind.policy().max_file_count,
                }
                .into()))
            } else if let Some(file) = files.pop() {
                KindOutcome::Single(self.process_single(kind, file).await)
            } else {
                continue;
            };
            result.results.push(KindResult {
                kind,
                file_count,
                outcome,
            });
        }

        Ok(result)
    }

    async fn store_all(
        &self,
        kind: AssetKind,
        derivatives: Vec<Derivative>,
    ) -> Result<Vec<StoredDerivative>, AppError> {
        let base_name = generate_base_name();
        let mut stored: Vec<StoredDerivative> = Vec::with_capacity(derivatives.len());

        for derivative in derivatives {
            let Derivative {
                label,
                dimensions,
                format,
                data,
            } = derivative;

            match self.store.store(data, kind, &base_name, label, format).await {
                Ok(asset) => stored.push(StoredDerivative {
                    label,
                    dimensions,
                    asset,
                }),
                Err(e) => {
                    tracing::error!(error = %e, label, "Failed to store derivative, rolling back");
                    let written: Vec<StoredAsset> =
                        stored.into_iter().map(|d| d.asset).collect();
                    self.store.remove_all(&written).await;
                    return Err(e.into());
                }
            }
        }

        Ok(stored)
    }
}
