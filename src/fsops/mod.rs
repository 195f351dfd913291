//! Host filesystem operations for ozima.
//!
//! Unlike the storage root, these operate on arbitrary host paths supplied
//! by the caller.

mod archive;
mod copy;
mod size;

pub use archive::{ArchiveStream, DirectoryArchive};
pub use copy::{copy_file, CopyOutcome};
pub use size::directory_size;
