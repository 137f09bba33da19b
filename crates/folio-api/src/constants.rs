//! API constants

use std::time::Duration;

/// API base path prefix
pub const API_BASE: &str = "/api";

/// Prefix shared by every upload and cleanup endpoint
pub const UPLOAD_PREFIX: &str = "/api/upload";

pub const OPENAPI_PATH: &str = "/api/openapi.json";

pub const HEALTH_PATH: &str = "/health";

/// Storage probe budget for the health endpoint
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Server-level cap on in-flight requests
pub const HTTP_CONCURRENCY_LIMIT: usize = 1024;
