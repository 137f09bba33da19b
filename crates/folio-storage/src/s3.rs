use crate::keys::{self, validate_key};
use crate::traits::{Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use folio_core::StoredAsset;
use futures::StreamExt;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult,
};
use std::time::SystemTime;

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    key_prefix: String,
    public_base_url: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    /// * `key_prefix` - Object prefix playing the role of the uploads root
    /// * `public_base_url` - Base of issued URLs; derived from bucket and region when `None`
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        key_prefix: String,
        public_base_url: Option<String>,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        let key_prefix = key_prefix.trim_matches('/').to_string();
        let public_base_url = public_base_url
            .unwrap_or_else(|| default_public_base_url(&bucket, &region, endpoint_url.as_deref()))
            .trim_end_matches('/')
            .to_string();

        Ok(S3Storage {
            store,
            bucket,
            key_prefix,
            public_base_url,
        })
    }

    fn object_path(&self, key: &str) -> Path {
        if self.key_prefix.is_empty() {
            Path::from(key.to_string())
        } else {
            Path::from(format!("{}/{}", self.key_prefix, key))
        }
    }

    fn root_path(&self) -> Option<Path> {
        if self.key_prefix.is_empty() {
            None
        } else {
            Some(Path::from(self.key_prefix.clone()))
        }
    }

    fn object_to_key(&self, location: &Path) -> Option<String> {
        let full: &str = location.as_ref();
        if self.key_prefix.is_empty() {
            return Some(full.to_string());
        }
        full.strip_prefix(&self.key_prefix)?
            .strip_prefix('/')
            .map(String::from)
    }
}

/// Public URL base for a bucket.
///
/// For AWS S3: `https://{bucket}.s3.{region}.amazonaws.com`. For S3-compatible
/// providers the path-style form `{endpoint}/{bucket}` is used.
fn default_public_base_url(bucket: &str, region: &str, endpoint: Option<&str>) -> String {
    match endpoint {
        Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
        None => format!("https://{}.s3.{}.amazonaws.com", bucket, region),
    }
}

/// Put options tagging the object with its MIME type.
fn put_options(content_type: &str) -> PutOptions {
    let mut attributes = Attributes::new();
    attributes.insert(Attribute::ContentType, content_type.to_string().into());
    PutOptions {
        attributes,
        ..Default::default()
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<StoredAsset> {
        validate_key(key)?;
        let size = data.len() as u64;
        let location = self.object_path(key);
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self
            .store
            .put_opts(
                &location,
                PutPayload::from(Bytes::from(data)),
                put_options(content_type),
            )
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(StoredAsset::RemoteFile {
            name: key.rsplit('/').next().unwrap_or(key).to_string(),
            key: key.to_string(),
            bucket: self.bucket.clone(),
            url: self.reference_for_key(key),
            size_bytes: size,
        })
    }

    async fn read(&self, key: &str) -> StorageResult<Vec<u8>> {
        validate_key(key)?;
        let location = self.object_path(key);

        let result: ObjectResult<_> = self.store.get(&location).await;
        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => StorageError::DownloadFailed(other.to_string()),
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        Ok(bytes.to_vec())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        let start = std::time::Instant::now();
        let location = self.object_path(key);

        let result: ObjectResult<_> = self.store.delete(&location).await;

        match result {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {}
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                return Err(StorageError::DeleteFailed(e.to_string()));
            }
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        let location = self.object_path(key);
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn list(&self) -> StorageResult<Vec<StoredObject>> {
        let root = self.root_path();
        let mut stream = self.store.list(root.as_ref());
        let mut objects = Vec::new();

        while let Some(item) = stream.next().await {
            let meta = item.map_err(|e| StorageError::BackendError(e.to_string()))?;
            let Some(key) = self.object_to_key(&meta.location) else {
                continue;
            };
            objects.push(StoredObject {
                key,
                size_bytes: meta.size as u64,
                modified: Some(SystemTime::from(meta.last_modified)),
            });
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    async fn health_check(&self) -> StorageResult<()> {
        let root = self.root_path();
        let mut stream = self.store.list(root.as_ref());
        match stream.next().await {
            Some(Err(e)) => Err(StorageError::BackendError(e.to_string())),
            _ => Ok(()),
        }
    }

    fn reference_for_key(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            format!("{}/{}", self.public_base_url, key)
        } else {
            format!("{}/{}/{}", self.public_base_url, self.key_prefix, key)
        }
    }

    fn key_for_reference(&self, reference: &str) -> Option<String> {
        let normalized = keys::normalize_reference(reference);
        let rest = normalized
            .strip_prefix(&self.public_base_url)?
            .strip_prefix('/')?;
        let key = if self.key_prefix.is_empty() {
            rest
        } else {
            rest.strip_prefix(&self.key_prefix)?.strip_prefix('/')?
        };
        validate_key(key).ok()?;
        Some(key.to_string())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
