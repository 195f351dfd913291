//! Single file copy between host paths.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

use serde::Serialize;

use crate::{OzimaError, Result};

/// Result of a successful copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyOutcome {
    pub source: String,
    pub destination: String,
    pub size_bytes: u64,
}

/// Copy `source` to `destination`.
///
/// The destination is left untouched when it exists and `overwrite` is
/// false; a symlink at the destination counts as existing even when its
/// target does not. Missing parent directories of the destination are
/// created.
pub fn copy_file(source: &Path, destination: &Path, overwrite: bool) -> Result<CopyOutcome> {
    if !source.exists() {
        return Err(OzimaError::NotFound("Source file".to_string()));
    }
    if !source.is_file() {
        return Err(OzimaError::Validation(format!(
            "source is not a regular file: {}",
            source.display()
        )));
    }

    let existing = match fs::symlink_metadata(destination) {
        Ok(metadata) => Some(metadata),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(e.into()),
    };

    if let Some(metadata) = existing {
        if !overwrite {
            return Err(already_exists(destination));
        }
        if metadata.is_dir() || destination.is_dir() {
            return Err(OzimaError::Validation(format!(
                "destination is a directory: {}",
                destination.display()
            )));
        }
        // Copying a file onto itself would truncate it.
        if let Ok(resolved) = fs::canonicalize(destination) {
            if fs::canonicalize(source)? == resolved {
                return Err(OzimaError::Validation(
                    "source and destination are the same file".to_string(),
                ));
            }
        }
    }

    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let size_bytes = if overwrite {
        fs::copy(source, destination)?
    } else {
        copy_to_new(source, destination)?
    };

    tracing::info!(
        source = %source.display(),
        destination = %destination.display(),
        size_bytes,
        "File copied"
    );

    Ok(CopyOutcome {
        source: source.display().to_string(),
        destination: destination.display().to_string(),
        size_bytes,
    })
}

fn already_exists(destination: &Path) -> OzimaError {
    OzimaError::Validation(format!(
        "destination already exists: {}",
        destination.display()
    ))
}

/// Copy into a destination that must not exist when it is opened.
fn copy_to_new(source: &Path, destination: &Path) -> Result<u64> {
    let mut input = File::open(source)?;
    let mut output = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
    {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(already_exists(destination));
        }
        Err(e) => return Err(e.into()),
    };

    let copied = io::copy(&mut input, &mut output)
        .and_then(|size| {
            output.set_permissions(input.metadata()?.permissions())?;
            Ok(size)
        });
    match copied {
        Ok(size) => Ok(size),
        Err(e) => {
            drop(output);
            let _ = fs::remove_file(destination);
            Err(e.into())
        }
    }
}
