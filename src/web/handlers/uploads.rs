//! Upload session handlers for the storage API.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use super::{run_blocking, StorageState};
use crate::upload::UploadSession;
use crate::web::dto::StatusResponse;
use crate::web::error::ApiError;

/// GET /api/uploads/:upload_id - Chunks received so far.
pub async fn get_upload(
    State(state): State<Arc<StorageState>>,
    Path(upload_id): Path<String>,
) -> Result<Json<UploadSession>, ApiError> {
    let session = run_blocking(move || state.reassembler.chunks().session(&upload_id)).await?;
    Ok(Json(session))
}

/// DELETE /api/uploads/:upload_id - Abort an upload and drop its chunks.
pub async fn abort_upload(
    State(state): State<Arc<StorageState>>,
    Path(upload_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let discarded = run_blocking(move || state.reassembler.abort(&upload_id)).await?;

    if !discarded {
        return Err(ApiError::not_found("Upload not found"));
    }
    Ok(Json(StatusResponse::success()))
}
