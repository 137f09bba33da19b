//! Orphan cleanup by keep-set reachability.

use folio_core::{format_bytes, AppError};
use folio_storage::keys::normalize_reference;
use folio_storage::{Storage, StoredObject};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// What one sweep did. Every list holds references in the Store's format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub deleted_files: Vec<String>,
    pub kept_files: Vec<String>,
    /// Unreferenced files whose delete failed; they are left in place
    pub failed_files: Vec<String>,
    /// Unreferenced files younger than the grace period
    pub skipped_recent: Vec<String>,
    pub bytes_freed: u64,
}

impl ReconcileReport {
    pub fn total_deleted(&self) -> usize {
        self.deleted_files.len()
    }

    pub fn total_kept(&self) -> usize {
        self.kept_files.len()
    }

    pub fn space_freed(&self) -> String {
        format_bytes(self.bytes_freed)
    }
}

/// Deletes every stored asset that no owning record references.
#[derive(Clone)]
pub struct Reconciler {
    storage: Arc<dyn Storage>,
    grace_period: Duration,
}

impl Reconciler {
    pub fn new(storage: Arc<dyn Storage>, grace_period: Duration) -> Self {
        Self {
            storage,
            grace_period,
        }
    }

    /// Sweep the uploads root, keeping only what `keep` references.
    ///
    /// Fails with `NotFound` if the root does not exist. A failed delete is logged and
    /// reported, never fatal.
    #[tracing::instrument(skip(self, keep), fields(cleanup.keep = keep.len()))]
    pub async fn reconcile(&self, keep: &[String]) -> Result<ReconcileReport, AppError> {
        let keep_set: HashSet<String> = keep
            .iter()
            .map(|r| normalize_reference(r))
            .filter(|r| !r.is_empty() && r != "/")
            .collect();

        let objects = self.storage.list().await?;
        let now = SystemTime::now();
        let mut report = ReconcileReport::default();

        for object in objects {
            let reference = normalize_reference(&self.storage.reference_for_key(&object.key));

            if keep_set.contains(&reference) {
                report.kept_files.push(reference);
                continue;
            }

            if self.is_recent(&object, now) {
                tracing::debug!(key = %object.key, "Skipping unreferenced file inside grace period");
                report.skipped_recent.push(reference);
                continue;
            }

            match self.storage.delete(&object.key).await {
                Ok(()) => {
                    tracing::debug!(key = %object.key, size_bytes = object.size_bytes, "Deleted orphaned file");
                    report.bytes_freed += object.size_bytes;
                    report.deleted_files.push(reference);
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        key = %object.key,
                        "Failed to delete orphaned file, continuing"
                    );
                    report.failed_files.push(reference);
                }
            }
        }

        tracing::info!(
            deleted = report.total_deleted(),
            kept = report.total_kept(),
            failed = report.failed_files.len(),
            skipped_recent = report.skipped_recent.len(),
            bytes_freed = report.bytes_freed,
            "Cleanup completed"
        );

        Ok(report)
    }

    fn is_recent(&self, object: &StoredObject, now: SystemTime) -> bool {
        if self.grace_period.is_zero() {
            return false;
        }
        match object.modified {
            Some(modified) => now
                .duration_since(modified)
                .map(|age| age < self.grace_period)
                .unwrap_or(true),
            None => false,
        }
    }
}
