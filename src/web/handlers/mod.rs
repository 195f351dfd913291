//! API handlers for ozima.

pub mod dirs;
pub mod files;
pub mod fsops;
pub mod uploads;

pub use dirs::*;
pub use files::*;
pub use fsops::*;
pub use uploads::*;

use std::path::PathBuf;

use crate::config::StorageConfig;
use crate::storage::StorageRoot;
use crate::upload::{ChunkStore, Reassembler};
use crate::web::error::ApiError;

/// Application state of the storage API.
#[derive(Debug, Clone)]
pub struct StorageState {
    /// Root holding stored files.
    pub storage: StorageRoot,
    /// Chunk store and reassembly.
    pub reassembler: Reassembler,
}

impl StorageState {
    /// Create the state, creating the storage root and chunk area.
    pub fn new(config: &StorageConfig) -> crate::Result<Self> {
        let storage = StorageRoot::new(&config.path)?;
        let chunks = ChunkStore::new(&config.chunk_path)?.with_max_chunks(config.max_chunks);

        Ok(Self {
            reassembler: Reassembler::new(chunks, storage.clone()),
            storage,
        })
    }
}

/// Application state of the filesystem-ops API.
#[derive(Debug, Clone)]
pub struct FsState {
    /// Directory receiving temporary archives.
    pub archive_dir: PathBuf,
}

impl FsState {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            archive_dir: config.archive_dir(),
        }
    }
}

/// Run filesystem work off the async runtime.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(work).await??)
}

/// Build a `Content-Disposition: attachment` value for a download.
///
/// Control characters are dropped and quotes replaced in the plain
/// `filename` parameter; non-ASCII names also get an RFC 5987 `filename*`.
pub(crate) fn content_disposition_header(filename: &str) -> String {
    let plain: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == '"' || c == '\\' { '_' } else { c })
        .collect();

    if filename.is_ascii() && plain == filename {
        return format!("attachment; filename=\"{filename}\"");
    }

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        plain,
        urlencoding::encode(filename)
    )
}
