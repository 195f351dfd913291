//! Directory archives streamed as tar.

use std::fs;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tempfile::TempPath;
use tokio_util::io::ReaderStream;

use crate::{OzimaError, Result};

const ARCHIVE_PREFIX: &str = "ozima-archive-";

/// An uncompressed tar of one directory, held in a temporary file.
///
/// Entries are stored as `<dir_name>/...`. The temporary file is deleted
/// when the archive (or the stream built from it) is dropped.
#[derive(Debug)]
pub struct DirectoryArchive {
    dir_name: String,
    path: TempPath,
}

impl DirectoryArchive {
    /// Archive `dir` into a new temporary file under `temp_dir`.
    pub fn build(dir: &Path, temp_dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(OzimaError::NotFound("Directory".to_string()));
        }

        let dir = fs::canonicalize(dir)?;
        let dir_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "root".to_string());

        fs::create_dir_all(temp_dir)?;
        let (file, path) = tempfile::Builder::new()
            .prefix(ARCHIVE_PREFIX)
            .suffix(".tar")
            .tempfile_in(temp_dir)?
            .into_parts();

        let mut builder = tar::Builder::new(file);
        builder.follow_symlinks(false);
        builder
            .append_dir_all(&dir_name, &dir)
            .map_err(|e| OzimaError::Archive(format!("{}: {e}", dir.display())))?;
        builder
            .into_inner()
            .map_err(|e| OzimaError::Archive(e.to_string()))?;

        tracing::info!(
            dir = %dir.display(),
            archive = %path.display(),
            "Directory archived"
        );

        Ok(Self { dir_name, path })
    }

    /// File name offered to the client.
    pub fn file_name(&self) -> String {
        format!("{}.tar", self.dir_name)
    }

    /// Location of the temporary archive.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the archive in bytes.
    pub fn size_bytes(&self) -> Result<u64> {
        Ok(fs::metadata(&self.path)?.len())
    }

    /// Open the archive as a byte stream that owns the temporary file.
    pub async fn into_stream(self) -> Result<ArchiveStream> {
        let file = tokio::fs::File::open(&self.path).await?;

        Ok(ArchiveStream {
            inner: ReaderStream::new(file),
            temp_path: self.path,
        })
    }
}

/// Byte stream over an archive; dropping it deletes the temporary file.
#[derive(Debug)]
pub struct ArchiveStream {
    inner: ReaderStream<tokio::fs::File>,
    temp_path: TempPath,
}

impl ArchiveStream {
    /// Location of the temporary archive backing this stream.
    pub fn path(&self) -> PathBuf {
        self.temp_path.to_path_buf()
    }
}

impl Stream for ArchiveStream {
    type Item = <ReaderStream<tokio::fs::File> as Stream>::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
