//! Reassembly of chunked uploads into stored files.
//!
//! Per upload-id the lifecycle is:
//!
//! ```text
//! Empty -> Receiving -> Reassembling -> Complete
//!                            |
//!                            +-> Failed (chunks left in place)
//! ```
//!
//! Completeness is checked before any byte is written. The output is staged
//! as a hidden file in the storage root and renamed into place only after the
//! last chunk has been appended, so a partially assembled file is never
//! listed or downloadable.
//!
//! Chunk writes hold a shared claim on their upload-id and reassembly or
//! abort an exclusive one, so a chunk can never land in an area that is being
//! drained or removed.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::chunk_store::ChunkStore;
use crate::storage::{secure_filename, StorageRoot};
use crate::{OzimaError, Result};

/// Missing indices named in a [`OzimaError::MissingChunks`] report.
const REPORTED_MISSING: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Claim {
    /// Reassembly or abort.
    Exclusive,
    /// Number of chunk writes in progress.
    Shared(usize),
}

/// Upload-ids with work currently running in this process.
#[derive(Debug, Default)]
struct InFlight {
    ids: Mutex<HashMap<String, Claim>>,
}

/// Claim on an upload-id; released on drop.
#[derive(Debug)]
pub struct UploadClaim {
    in_flight: Arc<InFlight>,
    upload_id: String,
    exclusive: bool,
}

impl Drop for UploadClaim {
    fn drop(&mut self) {
        let Ok(mut ids) = self.in_flight.ids.lock() else {
            return;
        };
        match ids.get(&self.upload_id).copied() {
            Some(Claim::Shared(writers)) if !self.exclusive && writers > 1 => {
                ids.insert(self.upload_id.clone(), Claim::Shared(writers - 1));
            }
            Some(_) => {
                ids.remove(&self.upload_id);
            }
            None => {}
        }
    }
}

/// Concatenates the chunks of an upload into the storage root.
#[derive(Debug, Clone)]
pub struct Reassembler {
    chunks: ChunkStore,
    storage: StorageRoot,
    in_flight: Arc<InFlight>,
}

impl Reassembler {
    /// Create a reassembler moving chunks from `chunks` into `storage`.
    pub fn new(chunks: ChunkStore, storage: StorageRoot) -> Self {
        Self {
            chunks,
            storage,
            in_flight: Arc::new(InFlight::default()),
        }
    }

    /// Chunk store this reassembler reads from.
    pub fn chunks(&self) -> &ChunkStore {
        &self.chunks
    }

    /// Claim an upload-id for reassembly.
    ///
    /// Fails with [`OzimaError::Conflict`] while any other claim is held.
    pub fn begin(&self, upload_id: &str) -> Result<UploadClaim> {
        self.claim(upload_id, true)
    }

    /// Claim an upload-id for writing one chunk.
    ///
    /// Any number of chunk writes may run together; fails with
    /// [`OzimaError::Conflict`] while the upload is being reassembled.
    pub fn begin_write(&self, upload_id: &str) -> Result<UploadClaim> {
        self.claim(upload_id, false)
    }

    fn claim(&self, upload_id: &str, exclusive: bool) -> Result<UploadClaim> {
        let key = secure_filename(upload_id);
        let mut ids = self
            .in_flight
            .ids
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "reassembly registry poisoned"))?;

        let next = match (ids.get(&key).copied(), exclusive) {
            (None, true) => Claim::Exclusive,
            (None, false) => Claim::Shared(1),
            (Some(Claim::Shared(writers)), false) => Claim::Shared(writers + 1),
            (Some(Claim::Exclusive), _) => {
                return Err(OzimaError::Conflict(format!(
                    "upload {key} is already being reassembled"
                )));
            }
            (Some(Claim::Shared(_)), true) => {
                return Err(OzimaError::Conflict(format!(
                    "upload {key} is still receiving chunks"
                )));
            }
        };
        ids.insert(key.clone(), next);

        Ok(UploadClaim {
            in_flight: Arc::clone(&self.in_flight),
            upload_id: key,
            exclusive,
        })
    }

    /// Store a non-final chunk of an upload.
    pub fn save_chunk(
        &self,
        upload_id: &str,
        index: u32,
        total_chunks: u32,
        data: &[u8],
    ) -> Result<()> {
        self.chunks.check_total(total_chunks)?;
        let _claim = self.begin_write(upload_id)?;
        self.chunks.save_chunk(upload_id, index, data)
    }

    /// Reassemble an upload whose chunks have all been stored.
    pub fn complete(&self, upload_id: &str, filename: &str, total_chunks: u32) -> Result<PathBuf> {
        let _claim = self.begin(upload_id)?;
        self.assemble(upload_id, filename, total_chunks)
    }

    /// Store the final chunk of an upload and reassemble it.
    ///
    /// The upload-id is claimed before the chunk is written, so a concurrent
    /// completion for the same id is rejected without touching disk.
    pub fn finish(
        &self,
        upload_id: &str,
        filename: &str,
        index: u32,
        total_chunks: u32,
        data: &[u8],
    ) -> Result<PathBuf> {
        self.chunks.check_total(total_chunks)?;
        let _claim = self.begin(upload_id)?;
        self.chunks.save_chunk(upload_id, index, data)?;
        self.assemble(upload_id, filename, total_chunks)
    }

    /// Drop every chunk of an upload.
    ///
    /// Returns `false` when no chunk area exists for the upload. Fails with
    /// [`OzimaError::Conflict`] while the upload is being reassembled.
    pub fn abort(&self, upload_id: &str) -> Result<bool> {
        let _claim = self.begin(upload_id)?;
        let discarded = self.chunks.discard(upload_id)?;
        if discarded {
            tracing::info!(upload_id, "Upload aborted");
        }
        Ok(discarded)
    }

    fn assemble(&self, upload_id: &str, filename: &str, total_chunks: u32) -> Result<PathBuf> {
        self.chunks.check_total(total_chunks)?;

        // Validates the name before reading any chunk.
        self.storage.resolve(filename)?;

        let session = self.chunks.session(upload_id)?;
        let missing_count = session.missing_count(total_chunks);
        if missing_count > 0 {
            let first_missing = session.missing_chunks(total_chunks, REPORTED_MISSING);
            tracing::warn!(
                upload_id = %session.upload_id,
                total_chunks,
                missing_count,
                first_missing = ?first_missing,
                "Reassembly requested with missing chunks"
            );
            return Err(OzimaError::MissingChunks {
                upload_id: session.upload_id,
                missing_count,
                first_missing,
            });
        }

        tracing::info!(
            upload_id = %session.upload_id,
            filename,
            total_chunks,
            "Assembling file from chunks"
        );

        let mut staged = self.storage.stage()?;
        let mut total_bytes = 0u64;
        {
            let mut output = BufWriter::new(staged.as_file_mut());
            for index in 1..=total_chunks {
                let path = self.chunks.chunk_path(upload_id, index)?;
                let mut chunk = match File::open(&path) {
                    Ok(file) => file,
                    // Removed between the scan and the read.
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        return Err(OzimaError::MissingChunks {
                            upload_id: session.upload_id,
                            missing_count: 1,
                            first_missing: vec![index],
                        });
                    }
                    Err(e) => return Err(e.into()),
                };
                total_bytes += io::copy(&mut chunk, &mut output)?;
            }
            output.flush()?;
        }

        let destination = self.storage.commit(staged, filename)?;

        for index in 1..=total_chunks {
            let path = self.chunks.chunk_path(upload_id, index)?;
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.chunks.discard(upload_id)?;

        tracing::info!(
            upload_id = %session.upload_id,
            path = %destination.display(),
            bytes = total_bytes,
            "Assembly complete"
        );

        Ok(destination)
    }
}
