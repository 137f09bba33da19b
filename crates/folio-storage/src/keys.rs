//! Key and reference layout shared by all backends.
//!
//! Stored names are `{kind}-{token}-{label}.{ext}` under the kind's directory. The
//! token is a random UUID so concurrent uploads never collide.

use crate::traits::{StorageError, StorageResult};
use folio_core::AssetKind;
use uuid::Uuid;

/// Fresh opaque token shared by all derivatives of one input file.
pub fn generate_base_name() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn asset_file_name(kind: AssetKind, base_name: &str, label: &str, extension: &str) -> String {
    format!("{}-{}-{}.{}", kind.as_str(), base_name, label, extension)
}

pub fn asset_key(kind: AssetKind, file_name: &str) -> String {
    format!("{}/{}", kind.storage_dir(), file_name)
}

/// Hidden sibling name used while a local write is in flight.
pub(crate) fn temp_file_name(file_name: &str) -> String {
    format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple())
}

pub(crate) fn is_temp_file_name(file_name: &str) -> bool {
    file_name.starts_with('.') && file_name.ends_with(".tmp")
}

/// Keys must stay inside the uploads root.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    if key.split('/').any(|part| part.is_empty() || part == "." || part == "..") {
        return Err(StorageError::InvalidKey(
            "Storage key contains an invalid path segment".to_string(),
        ));
    }
    Ok(())
}

/// Bring a caller-supplied reference into the exact form backends emit.
///
/// Trims whitespace, turns `\` into `/`, drops any query string or fragment and
/// percent-decodes. Paths get a leading `/`; absolute URLs are left rooted as they are.
pub fn normalize_reference(raw: &str) -> String {
    let trimmed = raw.trim().replace('\\', "/");
    let without_suffix = trimmed
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .to_string();
    let decoded = urlencoding::decode(&without_suffix)
        .map(|s| s.into_owned())
        .unwrap_or(without_suffix);

    if is_absolute_url(&decoded) || decoded.is_empty() || decoded.starts_with('/') {
        decoded
    } else {
        format!("/{}", decoded)
    }
}

pub(crate) fn is_absolute_url(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}
