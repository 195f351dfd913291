//! Web API module for ozima.
//!
//! Two routers share the same middleware stack: the storage API under
//! `/api` and the filesystem-ops API operating on host paths. Both expose an
//! unauthenticated `/health`; everything else requires the bearer token.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::{FsState, StorageState};
pub use middleware::TokenState;
pub use router::{create_fs_router, create_storage_router};
pub use server::WebServer;
