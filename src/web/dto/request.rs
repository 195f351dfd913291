//! Request DTOs for Web API.

use serde::Deserialize;

/// Directory creation request.
#[derive(Debug, Deserialize)]
pub struct CreateDirRequest {
    /// Directory name (sanitized like a filename).
    #[serde(default)]
    pub name: Option<String>,
}

/// Query carrying a host path.
#[derive(Debug, Deserialize)]
pub struct PathQuery {
    pub path: String,
}

/// Copy request parameters.
#[derive(Debug, Deserialize)]
pub struct CopyQuery {
    pub source: String,
    pub destination: String,
    #[serde(default)]
    pub overwrite: bool,
}

/// Text fields of a file upload form.
#[derive(Debug, Default)]
pub struct UploadFields {
    /// 1-based chunk index.
    pub chunk_number: Option<String>,
    /// Number of chunks in the upload.
    pub total_chunks: Option<String>,
    /// Caller-chosen upload-id.
    pub file_id: Option<String>,
}

/// Chunk position parsed from an upload form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPosition {
    pub index: u32,
    pub total: u32,
}

impl ChunkPosition {
    /// Whether this is the chunk that triggers reassembly.
    pub fn is_final(&self) -> bool {
        self.index == self.total
    }
}

impl UploadFields {
    /// Parse the chunk fields.
    ///
    /// Returns `Ok(None)` for a whole-file upload, where neither field is
    /// present.
    pub fn chunk_position(&self) -> Result<Option<ChunkPosition>, String> {
        let (index, total) = match (&self.chunk_number, &self.total_chunks) {
            (None, None) => return Ok(None),
            (Some(index), Some(total)) => (index, total),
            _ => {
                return Err("chunk_number and total_chunks must be sent together".to_string())
            }
        };

        let index: u32 = index
            .trim()
            .parse()
            .map_err(|_| format!("invalid chunk_number: {index:?}"))?;
        let total: u32 = total
            .trim()
            .parse()
            .map_err(|_| format!("invalid total_chunks: {total:?}"))?;

        if index < 1 {
            return Err("chunk_number must be at least 1".to_string());
        }
        if total < 1 {
            return Err("total_chunks must be at least 1".to_string());
        }
        if index > total {
            return Err(format!(
                "chunk_number {index} exceeds total_chunks {total}"
            ));
        }

        Ok(Some(ChunkPosition { index, total }))
    }
}
