//! Test helpers: build AppState and router for integration tests.
//!
//! Every app gets its own temporary uploads root on local storage.

#![allow(dead_code)]

pub mod fixtures;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use folio_api::setup::routes;
use folio_api::state::AppState;
use folio_core::{Config, UploadConfig};
use folio_storage::{LocalStorage, Storage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Test application: server plus the uploads root it writes to.
pub struct TestApp {
    pub server: TestServer,
    pub uploads_root: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// On-disk path of a `/uploads/...` reference returned by the API.
    pub fn path_for(&self, reference: &str) -> PathBuf {
        let key = reference
            .strip_prefix("/uploads/")
            .expect("reference outside the uploads prefix");
        self.uploads_root.join(key)
    }

    /// Every regular file under the uploads root, relative and `/`-separated.
    pub fn stored_files(&self) -> Vec<String> {
        let mut files = Vec::new();
        collect_files(&self.uploads_root, &self.uploads_root, &mut files);
        files.sort();
        files
    }
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, out);
        } else if let Ok(relative) = path.strip_prefix(root) {
            out.push(relative.to_string_lossy().replace('\\', "/"));
        }
    }
}

/// Setup test app with an isolated uploads root on local storage.
pub async fn setup_test_app() -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let uploads_root = temp_dir.path().join("public").join("uploads");

    let config = Config::from(UploadConfig::local(&uploads_root));
    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(uploads_root.clone(), config.public_uploads_prefix())
            .await
            .expect("Failed to create local storage"),
    );

    let state = Arc::new(AppState::new(config.clone(), storage));
    let app = routes::setup_routes(&config, state).expect("Failed to build routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        uploads_root,
        _temp_dir: temp_dir,
    }
}

/// One file part with an explicit name and MIME type.
pub fn file_part(data: Vec<u8>, file_name: &str, mime_type: &str) -> Part {
    Part::bytes(bytes::Bytes::from(data))
        .file_name(file_name)
        .mime_type(mime_type)
}

/// Multipart form with a single file under `field`.
pub fn single_file_form(field: &str, data: Vec<u8>, file_name: &str, mime_type: &str) -> MultipartForm {
    MultipartForm::new().add_part(field, file_part(data, file_name, mime_type))
}
