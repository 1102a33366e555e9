use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// リクエストごとに 1 行の構造化ログを出す
pub async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    if response.status().is_server_error() {
        tracing::warn!(%method, %path, status, elapsed_ms, "Request completed");
    } else {
        tracing::info!(%method, %path, status, elapsed_ms, "Request completed");
    }

    response
}
