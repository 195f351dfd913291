//! Recursive directory size.

use std::path::Path;

use walkdir::WalkDir;

use crate::Result;

/// Sum the sizes of every regular file below `path`.
///
/// Symlinks are neither followed nor counted. Any walk error, including a
/// path that does not exist, is returned to the caller.
pub fn directory_size(path: &Path) -> Result<u64> {
    let mut total = 0u64;

    for entry in WalkDir::new(path).follow_links(false) {
        let entry = entry?;
        if entry.file_type().is_file() {
            total += entry.metadata()?.len();
        }
    }

    tracing::debug!(path = %path.display(), size_bytes = total, "Directory size computed");

    Ok(total)
}
