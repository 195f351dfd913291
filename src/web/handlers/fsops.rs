//! Handlers for the filesystem-ops API.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};

use super::{content_disposition_header, run_blocking, FsState};
use crate::fsops::{self, DirectoryArchive};
use crate::web::dto::{CopyQuery, CopyResponse, DirectorySizeResponse, PathQuery};
use crate::web::error::ApiError;

/// GET /directory_size/?path= - Total size of regular files below a path.
///
/// Every failure is reported as 400.
pub async fn directory_size(
    Query(query): Query<PathQuery>,
) -> Result<Json<DirectorySizeResponse>, ApiError> {
    let path = PathBuf::from(&query.path);

    let size = tokio::task::spawn_blocking(move || fsops::directory_size(&path))
        .await?
        .map_err(|e| {
            tracing::warn!(path = %query.path, "Directory size failed: {}", e);
            ApiError::bad_request(e.to_string())
        })?;

    Ok(Json(DirectorySizeResponse {
        path: query.path,
        size_bytes: size,
    }))
}

/// GET /download_directory/?path= - Download a directory as a tar archive.
///
/// The archive is built in a temporary file owned by the response body and
/// removed once the body is dropped.
pub async fn download_directory(
    State(state): State<Arc<FsState>>,
    Query(query): Query<PathQuery>,
) -> Result<Response, ApiError> {
    let dir = PathBuf::from(&query.path);
    let archive_dir = state.archive_dir.clone();

    let archive = run_blocking(move || DirectoryArchive::build(&dir, &archive_dir)).await?;
    let file_name = archive.file_name();
    let size = archive.size_bytes()?;
    let stream = archive.into_stream().await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-tar")
        .header(header::CONTENT_LENGTH, size)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&file_name),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| {
            tracing::error!("Failed to build archive response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// POST /copy_file/?source=&destination=&overwrite= - Copy a single file.
pub async fn copy_file(Query(query): Query<CopyQuery>) -> Result<Json<CopyResponse>, ApiError> {
    let source = PathBuf::from(&query.source);
    let destination = PathBuf::from(&query.destination);
    let overwrite = query.overwrite;

    let outcome =
        run_blocking(move || fsops::copy_file(&source, &destination, overwrite)).await?;

    Ok(Json(CopyResponse::from(outcome)))
}
