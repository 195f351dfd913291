//! File handlers for the storage API.

use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tokio_util::io::ReaderStream;

use super::{content_disposition_header, run_blocking, StorageState};
use crate::storage::{secure_filename, FileInfo};
use crate::upload::derive_upload_id;
use crate::web::dto::{ChunkUploadedResponse, StatusResponse, UploadFields};
use crate::web::error::{ApiError, ErrorCode};
use crate::OzimaError;

fn multipart_error(e: MultipartError) -> ApiError {
    tracing::warn!("Failed to read multipart body: {}", e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(ErrorCode::PayloadTooLarge, "Upload exceeds the size limit")
    } else {
        ApiError::bad_request("Invalid multipart data")
    }
}

/// GET /api/files - List stored files with their metadata.
pub async fn list_files(
    State(state): State<Arc<StorageState>>,
) -> Result<Json<BTreeMap<String, FileInfo>>, ApiError> {
    let files = run_blocking(move || state.storage.list_files()).await?;
    Ok(Json(files))
}

/// GET /api/files/:filename - Download a stored file.
pub async fn download_file(
    State(state): State<Arc<StorageState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let not_found = || ApiError::not_found("File not found");

    let path = state.storage.resolve(&filename).map_err(|_| not_found())?;
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found()),
        Err(e) => return Err(OzimaError::from(e).into()),
    };
    let metadata = file.metadata().await.map_err(OzimaError::from)?;
    if !metadata.is_file() {
        return Err(not_found());
    }

    let stored_name = secure_filename(&filename);
    let content_type = mime_guess::from_path(&stored_name)
        .first_or_octet_stream()
        .to_string();

    tracing::debug!(file = %stored_name, size = metadata.len(), "Serving file");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, metadata.len())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&stored_name),
        )
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| {
            tracing::error!("Failed to build download response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// DELETE /api/files/:filename - Delete a stored file.
pub async fn delete_file(
    State(state): State<Arc<StorageState>>,
    Path(filename): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let name = filename.clone();
    let deleted = run_blocking(move || state.storage.delete(&name)).await?;

    if !deleted {
        return Err(ApiError::not_found("File not found"));
    }

    tracing::info!(file = %secure_filename(&filename), "File deleted");
    Ok(Json(StatusResponse::success()))
}

/// GET /api/files/:filename/info - Metadata of a stored file.
pub async fn file_info(
    State(state): State<Arc<StorageState>>,
    Path(filename): Path<String>,
) -> Result<Json<FileInfo>, ApiError> {
    run_blocking(move || state.storage.describe(&filename))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("File not found"))
}

/// POST /api/files/:filename - Upload a whole file or one chunk of it.
///
/// Request body: multipart/form-data with a `file` part and the optional
/// text fields `chunk_number`, `total_chunks` and `file_id`. The chunk whose
/// number equals `total_chunks` triggers reassembly.
pub async fn upload_file(
    State(state): State<Arc<StorageState>>,
    Path(filename): Path<String>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut fields = UploadFields::default();
    let mut file: Option<(Option<String>, Bytes)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let selected = field.file_name().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some((selected, data));
            }
            "chunk_number" => {
                fields.chunk_number = Some(field.text().await.map_err(multipart_error)?);
            }
            "total_chunks" => {
                fields.total_chunks = Some(field.text().await.map_err(multipart_error)?);
            }
            "file_id" => {
                fields.file_id = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let (selected, data) = match file {
        Some((Some(selected), data)) => (selected, data),
        _ => return Err(ApiError::bad_request("No file part")),
    };
    if selected.is_empty() {
        return Err(ApiError::bad_request("No selected file"));
    }

    let position = fields.chunk_position().map_err(ApiError::bad_request)?;
    state.storage.resolve(&filename)?;

    let Some(position) = position else {
        let size = data.len();
        let name = filename.clone();
        run_blocking(move || state.storage.save(&name, &data)).await?;

        tracing::info!(file = %secure_filename(&filename), size, "File uploaded");
        return Ok(Json(StatusResponse::success()).into_response());
    };

    let upload_id = fields
        .file_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| derive_upload_id(&filename));

    if !position.is_final() {
        run_blocking(move || {
            state
                .reassembler
                .save_chunk(&upload_id, position.index, position.total, &data)
        })
        .await?;
        return Ok(Json(ChunkUploadedResponse::new(position.index)).into_response());
    }

    run_blocking(move || {
        state
            .reassembler
            .finish(&upload_id, &filename, position.index, position.total, &data)
    })
    .await?;

    Ok(Json(StatusResponse::completed()).into_response())
}
