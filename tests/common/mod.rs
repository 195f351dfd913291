//! Test helpers for the Web API tests.
//!
//! Builds both routers over temporary directories so every test gets its
//! own storage root, chunk area and archive directory.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use tempfile::TempDir;

use ozima::config::StorageConfig;
use ozima::web::{
    create_fs_router, create_storage_router, FsState, StorageState, TokenState,
};

/// Token accepted by the test servers.
pub const TEST_TOKEN: &str = "test-token-for-testing-only";

/// Value of the `Authorization` header for [`TEST_TOKEN`].
pub fn bearer() -> String {
    format!("Bearer {}", TEST_TOKEN)
}

/// Directories backing a test server.
pub struct TestDirs {
    pub temp_dir: TempDir,
}

impl TestDirs {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn storage(&self) -> PathBuf {
        self.temp_dir.path().join("storage")
    }

    pub fn chunks(&self) -> PathBuf {
        self.temp_dir.path().join("chunks")
    }

    pub fn archives(&self) -> PathBuf {
        self.temp_dir.path().join("archives")
    }

    /// Scratch area for host-path operations.
    pub fn host(&self) -> PathBuf {
        let path = self.temp_dir.path().join("host");
        std::fs::create_dir_all(&path).expect("Failed to create host dir");
        path
    }

    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            path: self.storage().display().to_string(),
            chunk_path: self.chunks().display().to_string(),
            max_upload_size_mb: 16,
            max_chunks: 1_000,
            archive_path: self.archives().display().to_string(),
        }
    }
}

/// Create a storage API test server.
pub fn create_storage_server() -> (TestServer, TestDirs) {
    let dirs = TestDirs::new();
    let limit = dirs.storage_config().max_upload_size_bytes();
    let (server, _state) = storage_server_for(&dirs, limit);
    (server, dirs)
}

/// Create a storage API test server with a body limit in bytes, keeping a
/// handle on its state.
pub fn create_storage_server_with_limit(
    max_upload_size: usize,
) -> (TestServer, TestDirs, Arc<StorageState>) {
    let dirs = TestDirs::new();
    let (server, state) = storage_server_for(&dirs, max_upload_size);
    (server, dirs, state)
}

fn storage_server_for(dirs: &TestDirs, max_upload_size: usize) -> (TestServer, Arc<StorageState>) {
    let config = dirs.storage_config();

    let state = Arc::new(StorageState::new(&config).expect("Failed to create storage state"));
    let token_state = Arc::new(TokenState::new(TEST_TOKEN));
    let router = create_storage_router(Arc::clone(&state), token_state, max_upload_size);

    let server = TestServer::new(router).expect("Failed to create test server");
    (server, state)
}

/// Create a filesystem-ops API test server.
pub fn create_fs_server() -> (TestServer, TestDirs) {
    let dirs = TestDirs::new();
    let config = dirs.storage_config();

    let state = Arc::new(FsState::new(&config));
    let token_state = Arc::new(TokenState::new(TEST_TOKEN));
    let router = create_fs_router(state, token_state);

    let server = TestServer::new(router).expect("Failed to create test server");
    (server, dirs)
}

/// Multipart form holding a whole file.
pub fn file_form(file_name: &str, content: &[u8]) -> MultipartForm {
    MultipartForm::new().add_part("file", Part::bytes(content.to_vec()).file_name(file_name))
}

/// Multipart form holding one chunk of an upload.
pub fn chunk_form(content: &[u8], chunk_number: u32, total_chunks: u32) -> MultipartForm {
    file_form("blob", content)
        .add_text("chunk_number", chunk_number.to_string())
        .add_text("total_chunks", total_chunks.to_string())
}

/// Names of the entries directly inside `dir`, sorted.
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}
