//! Configuration module
//!
//! Every setting is read once at startup from the environment (with `.env` support)
//! and then passed around explicitly. In particular the uploads root is resolved to
//! one absolute directory here; nothing else probes for it at runtime.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::storage_types::StorageBackend;

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_UPLOADS_ROOT: &str = "public/uploads";
const DEFAULT_PUBLIC_UPLOADS_PREFIX: &str = "/uploads";
const DEFAULT_S3_KEY_PREFIX: &str = "uploads";
const DEFAULT_CLEANUP_GRACE_PERIOD_SECS: u64 = 0;
const DEFAULT_MAX_REQUEST_BODY_MB: usize = 120;
const DEFAULT_PICTURE_CONCURRENCY: usize = 4;

/// Base server configuration
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
}

/// Upload pipeline configuration
#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub base: BaseConfig,
    pub storage_backend: StorageBackend,
    /// Absolute directory holding every local derivative
    pub uploads_root: PathBuf,
    /// Public path prefix under which local derivatives are referenced and served
    pub public_uploads_prefix: String,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    /// Custom endpoint for S3-compatible providers (MinIO, DigitalOcean Spaces, ...)
    pub s3_endpoint: Option<String>,
    pub s3_key_prefix: String,
    /// CDN or bucket URL prepended to object keys; derived from bucket/region when unset
    pub s3_public_base_url: Option<String>,
    /// Unreferenced files younger than this survive a cleanup pass. 0 = disabled.
    pub cleanup_grace_period_secs: u64,
    pub max_request_body_bytes: usize,
    /// Pictures of one batch transformed concurrently
    pub picture_concurrency: usize,
}

impl UploadConfig {
    /// Local-storage configuration rooted at `uploads_root`, all other settings at defaults.
    pub fn local(uploads_root: impl Into<PathBuf>) -> Self {
        Self {
            base: BaseConfig {
                server_port: DEFAULT_PORT,
                cors_origins: vec!["*".to_string()],
                environment: "development".to_string(),
            },
            storage_backend: StorageBackend::Local,
            uploads_root: uploads_root.into(),
            public_uploads_prefix: DEFAULT_PUBLIC_UPLOADS_PREFIX.to_string(),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            s3_key_prefix: DEFAULT_S3_KEY_PREFIX.to_string(),
            s3_public_base_url: None,
            cleanup_grace_period_secs: DEFAULT_CLEANUP_GRACE_PERIOD_SECS,
            max_request_body_bytes: DEFAULT_MAX_REQUEST_BODY_MB * 1024 * 1024,
            picture_concurrency: DEFAULT_PICTURE_CONCURRENCY,
        }
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
        };

        let storage_backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .parse::<StorageBackend>()?;

        let uploads_root = resolve_uploads_root(
            &env::var("UPLOADS_ROOT").unwrap_or_else(|_| DEFAULT_UPLOADS_ROOT.to_string()),
        )?;

        let max_request_body_mb = env::var("MAX_REQUEST_BODY_MB")
            .unwrap_or_else(|_| DEFAULT_MAX_REQUEST_BODY_MB.to_string())
            .parse::<usize>()
            .unwrap_or(DEFAULT_MAX_REQUEST_BODY_MB);

        let config = UploadConfig {
            base,
            storage_backend,
            uploads_root,
            public_uploads_prefix: env::var("PUBLIC_UPLOADS_PREFIX")
                .unwrap_or_else(|_| DEFAULT_PUBLIC_UPLOADS_PREFIX.to_string())
                .trim_end_matches('/')
                .to_string(),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            s3_key_prefix: env::var("S3_KEY_PREFIX")
                .unwrap_or_else(|_| DEFAULT_S3_KEY_PREFIX.to_string())
                .trim_matches('/')
                .to_string(),
            s3_public_base_url: env::var("S3_PUBLIC_BASE_URL").ok(),
            cleanup_grace_period_secs: env::var("CLEANUP_GRACE_PERIOD_SECS")
                .unwrap_or_else(|_| DEFAULT_CLEANUP_GRACE_PERIOD_SECS.to_string())
                .parse()
                .unwrap_or(DEFAULT_CLEANUP_GRACE_PERIOD_SECS),
            max_request_body_bytes: max_request_body_mb * 1024 * 1024,
            picture_concurrency: env::var("PICTURE_CONCURRENCY")
                .unwrap_or_else(|_| DEFAULT_PICTURE_CONCURRENCY.to_string())
                .parse()
                .unwrap_or(DEFAULT_PICTURE_CONCURRENCY),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.public_uploads_prefix.starts_with('/') || self.public_uploads_prefix.len() < 2 {
            return Err(anyhow::anyhow!(
                "PUBLIC_UPLOADS_PREFIX must be an absolute path such as /uploads"
            ));
        }

        if self.max_request_body_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_REQUEST_BODY_MB must be greater than 0"));
        }

        if self.picture_concurrency == 0 {
            return Err(anyhow::anyhow!("PICTURE_CONCURRENCY must be greater than 0"));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.uploads_root.as_os_str().is_empty() {
                    return Err(anyhow::anyhow!(
                        "UPLOADS_ROOT must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}

fn resolve_uploads_root(raw: &str) -> Result<PathBuf, anyhow::Error> {
    let path = PathBuf::from(raw.trim());
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = env::current_dir()
        .map_err(|e| anyhow::anyhow!("Cannot resolve UPLOADS_ROOT relative path: {}", e))?;
    Ok(cwd.join(path))
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<UploadConfig>);

impl Config {
    fn as_upload(&self) -> &UploadConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = UploadConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_upload().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.as_upload().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn environment(&self) -> &str {
        &self.as_upload().base.environment
    }

    pub fn server_port(&self) -> u16 {
        self.as_upload().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_upload().base.cors_origins
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_upload().storage_backend
    }

    pub fn uploads_root(&self) -> &std::path::Path {
        &self.as_upload().uploads_root
    }

    pub fn public_uploads_prefix(&self) -> &str {
        &self.as_upload().public_uploads_prefix
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_upload().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_upload().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_upload().s3_endpoint.as_deref()
    }

    pub fn s3_key_prefix(&self) -> &str {
        &self.as_upload().s3_key_prefix
    }

    pub fn s3_public_base_url(&self) -> Option<&str> {
        self.as_upload().s3_public_base_url.as_deref()
    }

    pub fn cleanup_grace_period(&self) -> Duration {
        Duration::from_secs(self.as_upload().cleanup_grace_period_secs)
    }

    pub fn max_request_body_bytes(&self) -> usize {
        self.as_upload().max_request_body_bytes
    }

    pub fn picture_concurrency(&self) -> usize {
        self.as_upload().picture_concurrency
    }
}

impl From<UploadConfig> for Config {
    fn from(config: UploadConfig) -> Self {
        Config(Box::new(config))
    }
}
