//! ozima - remote filesystem API
//!
//! File storage with chunked uploads and server-side reassembly, plus
//! directory sizing, copying and archiving over HTTP.

pub mod config;
pub mod error;
pub mod fsops;
pub mod logging;
pub mod storage;
pub mod upload;
pub mod web;

pub use config::Config;
pub use error::{OzimaError, Result};
pub use storage::{FileInfo, StorageRoot};
pub use upload::{ChunkStore, Reassembler, UploadSession};
pub use web::WebServer;
