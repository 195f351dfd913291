//! Chunk Store
//!
//! Temporary storage for uploaded chunks before reassembly.
//!
//! ```text
//! {base_path}/
//! └── {upload_id}/
//!     ├── chunk_1
//!     ├── chunk_2
//!     └── ...
//! ```
//!
//! Each chunk index maps to its own file, so concurrent writes for different
//! indices of one upload never touch the same path. Rewriting an index
//! replaces the previous payload.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};

use super::session::UploadSession;
use crate::storage::secure_filename;
use crate::{OzimaError, Result};

/// File name prefix of a stored chunk.
pub const CHUNK_FILE_PREFIX: &str = "chunk_";

/// Default upper bound on `total_chunks` for one upload.
pub const DEFAULT_MAX_CHUNKS: u32 = 10_000;

/// Derive an upload-id from the target filename.
///
/// Used when the client does not send one. Two clients uploading the same
/// filename at the same time therefore share a session.
pub fn derive_upload_id(filename: &str) -> String {
    hex::encode(Md5::digest(filename.as_bytes()))
}

fn parse_chunk_index(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix(CHUNK_FILE_PREFIX)?
        .parse()
        .ok()
        .filter(|index| *index >= 1)
}

/// Filesystem-backed chunk storage.
#[derive(Debug, Clone)]
pub struct ChunkStore {
    base_path: PathBuf,
    max_chunks: u32,
}

impl ChunkStore {
    /// Create a chunk store rooted at `base_path`, creating it if needed.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        Ok(Self {
            base_path,
            max_chunks: DEFAULT_MAX_CHUNKS,
        })
    }

    /// Limit the number of chunks a single upload may be split into.
    pub fn with_max_chunks(mut self, max_chunks: u32) -> Self {
        self.max_chunks = max_chunks.max(1);
        self
    }

    /// Largest `total_chunks` accepted for one upload.
    pub fn max_chunks(&self) -> u32 {
        self.max_chunks
    }

    /// Reject a chunk count of zero or above the configured limit.
    pub fn check_total(&self, total_chunks: u32) -> Result<()> {
        if total_chunks == 0 {
            return Err(OzimaError::Validation(
                "total_chunks must be at least 1".to_string(),
            ));
        }
        if total_chunks > self.max_chunks {
            return Err(OzimaError::Validation(format!(
                "total_chunks {total_chunks} exceeds the limit of {}",
                self.max_chunks
            )));
        }
        Ok(())
    }

    /// Get the base path of this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Temporary directory for an upload.
    pub fn session_dir(&self, upload_id: &str) -> Result<PathBuf> {
        let safe = secure_filename(upload_id);
        if safe.is_empty() {
            return Err(OzimaError::Validation(format!(
                "invalid upload id: {upload_id:?}"
            )));
        }
        Ok(self.base_path.join(safe))
    }

    /// Path of one chunk file.
    pub fn chunk_path(&self, upload_id: &str, index: u32) -> Result<PathBuf> {
        Ok(self
            .session_dir(upload_id)?
            .join(format!("{CHUNK_FILE_PREFIX}{index}")))
    }

    /// Store a chunk, overwriting any earlier payload at the same index.
    pub fn save_chunk(&self, upload_id: &str, index: u32, data: &[u8]) -> Result<()> {
        if index == 0 {
            return Err(OzimaError::Validation(
                "chunk index must be at least 1".to_string(),
            ));
        }
        if index > self.max_chunks {
            return Err(OzimaError::Validation(format!(
                "chunk index {index} exceeds the limit of {}",
                self.max_chunks
            )));
        }

        let dir = self.session_dir(upload_id)?;
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(format!("{CHUNK_FILE_PREFIX}{index}")), data)?;

        tracing::debug!(upload_id, index, size = data.len(), "Chunk stored");

        Ok(())
    }

    /// Rebuild the session for an upload from the chunk files on disk.
    ///
    /// An upload with no temporary directory yields an empty session.
    pub fn session(&self, upload_id: &str) -> Result<UploadSession> {
        let dir = self.session_dir(upload_id)?;
        let mut session = UploadSession::new(secure_filename(upload_id));

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(session),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(index) = parse_chunk_index(&entry.file_name().to_string_lossy()) {
                session.mark_chunk_received(index);
            }
        }

        Ok(session)
    }

    /// Remove every chunk of an upload and its temporary directory.
    ///
    /// Returns `false` if the upload had no temporary directory.
    pub fn discard(&self, upload_id: &str) -> Result<bool> {
        let dir = self.session_dir(upload_id)?;

        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_store() -> (TempDir, ChunkStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = ChunkStore::new(temp_dir.path().join("chunks")).unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_derive_upload_id() {
        assert_eq!(
            derive_upload_id("hello.txt"),
            "2e54144ba487ae25d03a3caba233da71"
        );
        assert_eq!(derive_upload_id("a"), derive_upload_id("a"));
        assert_ne!(derive_upload_id("a"), derive_upload_id("b"));
    }

    #[test]
    fn test_parse_chunk_index() {
        assert_eq!(parse_chunk_index("chunk_1"), Some(1));
        assert_eq!(parse_chunk_index("chunk_42"), Some(42));
        assert_eq!(parse_chunk_index("chunk_0"), None);
        assert_eq!(parse_chunk_index("chunk_x"), None);
        assert_eq!(parse_chunk_index("other"), None);
    }

    #[test]
    fn test_save_chunk_writes_file() {
        let (_temp_dir, store) = setup_store();

        store.save_chunk("up1", 1, b"hello").unwrap();

        let path = store.chunk_path("up1", 1).unwrap();
        assert_eq!(path, store.base_path().join("up1").join("chunk_1"));
        assert_eq!(fs::read(path).unwrap(), b"hello");
    }

    #[test]
    fn test_save_chunk_rejects_index_zero() {
        let (_temp_dir, store) = setup_store();

        let result = store.save_chunk("up1", 0, b"data");

        assert!(matches!(result, Err(OzimaError::Validation(_))));
        assert!(!store.base_path().join("up1").exists());
    }

    #[test]
    fn test_save_chunk_overwrites() {
        let (_temp_dir, store) = setup_store();

        store.save_chunk("up1", 2, b"first attempt").unwrap();
        store.save_chunk("up1", 2, b"retry").unwrap();

        let path = store.chunk_path("up1", 2).unwrap();
        assert_eq!(fs::read(path).unwrap(), b"retry");
    }

    #[test]
    fn test_upload_id_is_sanitized() {
        let (_temp_dir, store) = setup_store();

        store.save_chunk("../escape", 1, b"x").unwrap();

        assert!(store.base_path().join("escape").join("chunk_1").exists());
        assert!(matches!(
            store.save_chunk("..", 1, b"x"),
            Err(OzimaError::Validation(_))
        ));
    }

    #[test]
    fn test_session_reflects_disk() {
        let (_temp_dir, store) = setup_store();

        store.save_chunk("up1", 3, b"c").unwrap();
        store.save_chunk("up1", 1, b"a").unwrap();
        fs::write(store.session_dir("up1").unwrap().join("stray"), b"?").unwrap();

        let session = store.session("up1").unwrap();

        assert_eq!(session.upload_id, "up1");
        assert_eq!(session.missing_chunks(3, 10), vec![2]);
    }

    #[test]
    fn test_session_unknown_upload() {
        let (_temp_dir, store) = setup_store();

        let session = store.session("never-seen").unwrap();

        assert!(session.is_empty());
    }

    #[test]
    fn test_discard() {
        let (_temp_dir, store) = setup_store();

        store.save_chunk("up1", 1, b"a").unwrap();
        store.save_chunk("up1", 2, b"b").unwrap();

        assert!(store.discard("up1").unwrap());
        assert!(!store.session_dir("up1").unwrap().exists());
        assert!(!store.discard("up1").unwrap());
    }

    #[test]
    fn test_concurrent_distinct_indices() {
        let (_temp_dir, store) = setup_store();

        let handles: Vec<_> = (1..=8u32)
            .map(|index| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .save_chunk("parallel", index, &[index as u8; 1024])
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let session = store.session("parallel").unwrap();
        assert!(session.is_complete(8));
        for index in 1..=8u32 {
            let data = fs::read(store.chunk_path("parallel", index).unwrap()).unwrap();
            assert_eq!(data, vec![index as u8; 1024]);
        }
    }

    #[test]
    fn test_chunk_limit() {
        let (_temp_dir, store) = setup_store();
        let store = store.with_max_chunks(4);

        assert!(store.check_total(4).is_ok());
        assert!(matches!(store.check_total(0), Err(OzimaError::Validation(_))));
        assert!(matches!(store.check_total(5), Err(OzimaError::Validation(_))));
        assert!(matches!(
            store.save_chunk("limited", 5, b"x"),
            Err(OzimaError::Validation(_))
        ));
        assert!(!store.session_dir("limited").unwrap().exists());
    }
}
