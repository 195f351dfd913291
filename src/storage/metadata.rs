//! On-demand metadata for stored files.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use serde::Serialize;

use crate::Result;

/// Block size used when streaming a file through the digest.
pub const CHECKSUM_BLOCK_SIZE: usize = 64 * 1024;

/// Size, modification time and checksum of a stored file.
///
/// Nothing here is cached; every value is read from disk when built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    /// File name relative to its directory.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: DateTime<Utc>,
    /// Lowercase hex MD5 of the content.
    pub md5: String,
}

impl FileInfo {
    /// Describe the regular file at `path`, reporting it under `name`.
    ///
    /// Returns `None` if nothing exists at `path` or it is not a regular file.
    pub fn describe(name: &str, path: &Path) -> Result<Option<Self>> {
        match File::open(path) {
            Ok(file) => Self::from_file(name, file),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Describe an already opened file.
    ///
    /// Size, time and checksum all come from the same handle, so the values
    /// stay consistent even if the path is removed or replaced meanwhile.
    pub fn from_file(name: &str, mut file: File) -> Result<Option<Self>> {
        let metadata = file.metadata()?;
        if !metadata.is_file() {
            return Ok(None);
        }

        Ok(Some(Self {
            name: name.to_string(),
            size: metadata.len(),
            modified: DateTime::<Utc>::from(metadata.modified()?),
            md5: md5_digest(&mut file)?,
        }))
    }
}

/// Compute the MD5 of a reader's content without buffering all of it.
pub fn md5_digest<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; CHECKSUM_BLOCK_SIZE];

    loop {
        let read = reader.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}
