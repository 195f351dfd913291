//! Chunked upload module for ozima.
//!
//! This module provides resumable uploads split into numbered chunks:
//! - Per-upload chunk storage outside the storage root
//! - Session state rebuilt from the chunk files on disk
//! - Reassembly into the storage root once every chunk is present

mod chunk_store;
mod reassembler;
mod session;

pub use chunk_store::{derive_upload_id, ChunkStore, CHUNK_FILE_PREFIX, DEFAULT_MAX_CHUNKS};
pub use reassembler::{Reassembler, UploadClaim};
pub use session::UploadSession;
