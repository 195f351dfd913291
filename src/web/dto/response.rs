//! Response DTOs for Web API.

use serde::Serialize;

use crate::fsops::CopyOutcome;

/// Plain status acknowledgement, e.g. `{"status": "success"}`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    /// `{"status": "success"}`.
    pub fn success() -> Self {
        Self { status: "success" }
    }

    /// `{"status": "completed"}`, sent after the final chunk.
    pub fn completed() -> Self {
        Self {
            status: "completed",
        }
    }
}

/// Acknowledgement of a stored non-final chunk.
#[derive(Debug, Serialize)]
pub struct ChunkUploadedResponse {
    pub status: &'static str,
    pub chunk_number: u32,
}

impl ChunkUploadedResponse {
    pub fn new(chunk_number: u32) -> Self {
        Self {
            status: "chunk_uploaded",
            chunk_number,
        }
    }
}

/// Directory size result.
#[derive(Debug, Serialize)]
pub struct DirectorySizeResponse {
    pub path: String,
    pub size_bytes: u64,
}

/// Copy result.
#[derive(Debug, Serialize)]
pub struct CopyResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub outcome: CopyOutcome,
}

impl From<CopyOutcome> for CopyResponse {
    fn from(outcome: CopyOutcome) -> Self {
        Self {
            status: "success",
            outcome,
        }
    }
}
