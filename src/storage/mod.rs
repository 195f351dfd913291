//! File storage module for ozima.
//!
//! This module provides the storage root that backs the file API:
//! - Sanitized name resolution under a fixed root
//! - Whole-file saves staged and renamed into place
//! - Listing, directory creation and on-demand metadata

mod metadata;
mod root;

pub use metadata::{md5_digest, FileInfo, CHECKSUM_BLOCK_SIZE};
pub use root::{secure_filename, DirectoryListing, StorageRoot};
