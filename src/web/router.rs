//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    abort_upload, copy_file, create_directory, delete_file, directory_size, download_directory,
    download_file, file_info, get_upload, list_directory, list_files, upload_file, FsState,
    StorageState,
};
use super::middleware::{log_requests, require_token, TokenState};

/// Create the storage API router.
pub fn create_storage_router(
    state: Arc<StorageState>,
    token_state: Arc<TokenState>,
    max_upload_size: usize,
) -> Router {
    let file_routes = Router::new()
        .route("/", get(list_files))
        .route(
            "/:filename",
            get(download_file).post(upload_file).delete(delete_file),
        )
        .route("/:filename/info", get(file_info));

    let dir_routes = Router::new()
        .route("/", post(create_directory))
        .route("/:dirname", get(list_directory));

    let upload_routes = Router::new().route("/:upload_id", get(get_upload).delete(abort_upload));

    let api_routes = Router::new()
        .nest("/files", file_routes)
        .nest("/dirs", dir_routes)
        .nest("/uploads", upload_routes)
        .route_layer(middleware::from_fn_with_state(token_state, require_token));

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(max_upload_size))
        .with_state(state)
        .merge(create_health_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(log_requests)),
        )
}

/// Create the filesystem-ops API router.
pub fn create_fs_router(state: Arc<FsState>, token_state: Arc<TokenState>) -> Router {
    let ops_routes = Router::new()
        .route("/directory_size/", get(directory_size))
        .route("/download_directory/", get(download_directory))
        .route("/copy_file/", post(copy_file))
        .route_layer(middleware::from_fn_with_state(token_state, require_token))
        .with_state(state);

    Router::new()
        .merge(ops_routes)
        .merge(create_health_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(log_requests)),
        )
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
