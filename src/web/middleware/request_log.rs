//! Request timing middleware.

use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};

/// Log method, path, status and elapsed time of every request.
pub async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    tracing::info!(
        "{} {} - Status: {} - {:.2}ms",
        method,
        path,
        response.status().as_u16(),
        elapsed_ms
    );

    response
}
