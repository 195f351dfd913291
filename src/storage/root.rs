//! Storage root for ozima.
//!
//! All stored files and directories live directly under a single base
//! directory. Every caller-supplied name goes through [`secure_filename`]
//! before it touches the filesystem, so resolved paths never leave the root.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

use super::metadata::FileInfo;
use crate::{OzimaError, Result};

/// Prefix of staging files; the leading dot keeps them out of listings and
/// unreachable through [`secure_filename`].
const STAGING_PREFIX: &str = ".ozima-";

/// Reduce an arbitrary name to a single safe path component.
///
/// Path separators and whitespace runs become `_`, anything other than ASCII
/// alphanumerics, `.`, `-` and `_` is dropped, and leading or trailing dots
/// and underscores are stripped. The result may be empty.
pub fn secure_filename(name: &str) -> String {
    let spaced: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();

    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Contents of a directory under the storage root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectoryListing {
    /// Regular files, sorted by name.
    pub files: Vec<FileInfo>,
    /// Subdirectory names, sorted.
    pub directories: Vec<String>,
}

/// Storage root resolving logical names to on-disk paths.
///
/// ```text
/// {base_path}/
/// ├── report.pdf
/// ├── photos/
/// │   └── cat.jpg
/// └── .ozima-XXXXXX   (staging file, never listed)
/// ```
#[derive(Debug, Clone)]
pub struct StorageRoot {
    base_path: PathBuf,
}

impl StorageRoot {
    /// Create a storage root at the given path.
    ///
    /// The base directory will be created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the base path of this storage root.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve a caller-supplied name to a path inside the root.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let safe = secure_filename(name);
        if safe.is_empty() {
            return Err(OzimaError::Validation(format!("invalid name: {name:?}")));
        }
        Ok(self.base_path.join(safe))
    }

    /// Open a hidden staging file inside the root.
    ///
    /// Content written here is invisible until [`StorageRoot::commit`] moves
    /// it into place; dropping the handle removes it.
    pub fn stage(&self) -> Result<NamedTempFile> {
        Ok(tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempfile_in(&self.base_path)?)
    }

    /// Atomically move a staged file to the resolved location of `name`.
    pub fn commit(&self, staged: NamedTempFile, name: &str) -> Result<PathBuf> {
        let destination = self.resolve(name)?;
        staged.as_file().sync_all()?;
        staged.persist(&destination).map_err(|e| e.error)?;
        Ok(destination)
    }

    /// Save a whole file in one shot, replacing any previous content.
    pub fn save(&self, name: &str, content: &[u8]) -> Result<PathBuf> {
        // Resolve first so an invalid name fails before anything is written.
        self.resolve(name)?;

        let mut staged = self.stage()?;
        staged.write_all(content)?;
        self.commit(staged, name)
    }

    /// Check if a regular file exists under `name`.
    pub fn exists(&self, name: &str) -> bool {
        self.resolve(name).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Delete a file.
    ///
    /// Returns `true` if the file was deleted, `false` if it didn't exist.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let path = match self.resolve(name) {
            Ok(p) => p,
            Err(_) => return Ok(false),
        };

        if !path.is_file() {
            return Ok(false);
        }

        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Describe a stored file, or `None` if it doesn't exist.
    pub fn describe(&self, name: &str) -> Result<Option<FileInfo>> {
        let path = match self.resolve(name) {
            Ok(p) => p,
            Err(_) => return Ok(None),
        };
        let stored_name = secure_filename(name);
        FileInfo::describe(&stored_name, &path)
    }

    /// List every regular file directly under the root with its metadata.
    pub fn list_files(&self) -> Result<BTreeMap<String, FileInfo>> {
        let mut files = BTreeMap::new();

        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            if let Some(info) = FileInfo::describe(&name, &entry.path())? {
                files.insert(name, info);
            }
        }

        Ok(files)
    }

    /// Create a directory under the root.
    ///
    /// Returns `false` if something already exists at that name.
    pub fn create_directory(&self, name: &str) -> Result<bool> {
        let path = self.resolve(name)?;

        match fs::create_dir(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// List the files and subdirectories of a directory under the root.
    pub fn list_directory(&self, name: &str) -> Result<DirectoryListing> {
        let path = self
            .resolve(name)
            .map_err(|_| OzimaError::NotFound("Directory".to_string()))?;

        if !path.is_dir() {
            return Err(OzimaError::NotFound("Directory".to_string()));
        }

        let mut listing = DirectoryListing::default();

        for entry in fs::read_dir(&path)? {
            let entry = entry?;
            let item = entry.file_name().to_string_lossy().into_owned();
            let file_type = entry.file_type()?;

            if file_type.is_dir() {
                listing.directories.push(item);
            } else if let Some(info) = FileInfo::describe(&item, &entry.path())? {
                listing.files.push(info);
            }
        }

        listing.files.sort_by(|a, b| a.name.cmp(&b.name));
        listing.directories.sort();

        Ok(listing)
    }
}
