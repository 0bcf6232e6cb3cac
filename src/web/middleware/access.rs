//! Access logging middleware.
//!
//! Tags every request with a fresh id (returned as `X-Request-Id`) and logs
//! method, path, status and latency once the response is ready.

use std::time::Instant;

use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;

use crate::web::types::RequestId;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub async fn log_access(mut req: Request<axum::body::Body>, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let request_id = RequestId::generate();
    req.extensions_mut().insert(request_id.clone());

    let span = tracing::info_span!("request", id = %request_id.0);
    let mut response = next.run(req).instrument(span.clone()).await;

    let status = response.status().as_u16();
    let latency_ms = started.elapsed().as_millis() as u64;
    span.in_scope(|| {
        tracing::info!(%method, path = %path, status, latency_ms, "Request handled");
    });

    if let Ok(value) = HeaderValue::from_str(&request_id.0) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
