//! Upload session state.

use std::collections::BTreeSet;

use serde::Serialize;

/// Chunks received so far for one upload-id.
///
/// Sessions are not persisted anywhere on their own: a session is rebuilt
/// from the chunk files present on disk whenever it is needed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadSession {
    /// Upload identifier (already sanitized).
    pub upload_id: String,
    /// 1-based indices of chunks present, ascending.
    pub received_chunks: BTreeSet<u32>,
}

impl UploadSession {
    /// Create an empty session.
    pub fn new(upload_id: impl Into<String>) -> Self {
        Self {
            upload_id: upload_id.into(),
            received_chunks: BTreeSet::new(),
        }
    }

    /// Whether no chunk has been received.
    pub fn is_empty(&self) -> bool {
        self.received_chunks.is_empty()
    }

    /// Mark a chunk as received.
    pub fn mark_chunk_received(&mut self, index: u32) {
        self.received_chunks.insert(index);
    }

    /// Number of indices in `1..=total_chunks` that have not been received.
    pub fn missing_count(&self, total_chunks: u32) -> u32 {
        if total_chunks == 0 {
            return 0;
        }
        let received = self.received_chunks.range(1..=total_chunks).count() as u32;
        total_chunks - received
    }

    /// The lowest `limit` indices in `1..=total_chunks` not yet received.
    pub fn missing_chunks(&self, total_chunks: u32, limit: usize) -> Vec<u32> {
        (1..=total_chunks)
            .filter(|i| !self.received_chunks.contains(i))
            .take(limit)
            .collect()
    }

    /// Check if every chunk in `1..=total_chunks` is present.
    pub fn is_complete(&self, total_chunks: u32) -> bool {
        total_chunks > 0 && self.missing_count(total_chunks) == 0
    }
}
