//! Error types for ozima.

use thiserror::Error;

/// Common error type for ozima.
#[derive(Error, Debug)]
pub enum OzimaError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Validation error for request parameters.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Operation collides with one already in progress.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Reassembly was signalled while chunks were still absent.
    #[error("upload {upload_id} is missing {missing_count} chunk(s), starting with {first_missing:?}")]
    MissingChunks {
        /// Upload the chunks belong to.
        upload_id: String,
        /// Number of absent chunks.
        missing_count: u32,
        /// Lowest absent indices, ascending; never the full list.
        first_missing: Vec<u32>,
    },

    /// Archive build error.
    #[error("archive error: {0}")]
    Archive(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<walkdir::Error> for OzimaError {
    fn from(e: walkdir::Error) -> Self {
        let message = e.to_string();
        match e.into_io_error() {
            Some(io) => OzimaError::Io(io),
            None => OzimaError::Validation(message),
        }
    }
}

/// Result type alias for ozima operations.
pub type Result<T> = std::result::Result<T, OzimaError>;
