//! Directory handlers for the storage API.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use super::{run_blocking, StorageState};
use crate::storage::DirectoryListing;
use crate::web::dto::{CreateDirRequest, StatusResponse};
use crate::web::error::ApiError;

/// POST /api/dirs - Create a directory under the storage root.
pub async fn create_directory(
    State(state): State<Arc<StorageState>>,
    Json(req): Json<CreateDirRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let name = req
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Directory name is required"))?;

    let dir = name.clone();
    let created = run_blocking(move || state.storage.create_directory(&dir)).await?;
    if !created {
        return Err(ApiError::bad_request("Directory already exists"));
    }

    tracing::info!(dir = %name, "Directory created");
    Ok(Json(StatusResponse::success()))
}

/// GET /api/dirs/:dirname - List a directory under the storage root.
pub async fn list_directory(
    State(state): State<Arc<StorageState>>,
    Path(dirname): Path<String>,
) -> Result<Json<DirectoryListing>, ApiError> {
    let listing = run_blocking(move || state.storage.list_directory(&dirname)).await?;
    Ok(Json(listing))
}
