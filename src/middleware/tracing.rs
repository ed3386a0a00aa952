//! Request tracing middleware

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use super::client_ip;

/// Log each request with its outcome and timing inside a per-request span
pub async fn request_tracing(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let client_ip = client_ip(&request);
    let request_id = Uuid::new_v4();

    let span = tracing::info_span!("request", %request_id, %method, %path);

    async move {
        let start = Instant::now();
        tracing::debug!(client_ip = ?client_ip, "Request started");

        let response = next.run(request).await;

        let duration_ms = start.elapsed().as_millis() as u64;
        let status = response.status().as_u16();

        if response.status().is_server_error() {
            tracing::error!(status, duration_ms, client_ip = ?client_ip, "Request failed");
        } else if response.status().is_client_error() {
            tracing::warn!(status, duration_ms, client_ip = ?client_ip, "Request rejected");
        } else {
            tracing::info!(status, duration_ms, client_ip = ?client_ip, "Request completed");
        }

        response
    }
    .instrument(span)
    .await
}
