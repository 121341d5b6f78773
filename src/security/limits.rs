//! Request body limits.
//!
//! # Responsibilities
//! - Enforce maximum request body size (413 on overflow)
//! - Decide which bodies are parsed as JSON
//!
//! # Design Decisions
//! - `RequestBodyLimitLayer` rejects on `Content-Length` before reading
//! - Streaming bodies are cut off at the same limit while buffering

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap},
};
use tower_http::limit::RequestBodyLimitLayer;

use crate::http::response::ApiError;

/// Layer enforcing the configured body size.
pub fn body_limit_layer(max_body_size: usize) -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(max_body_size)
}

/// True for `application/json` and `+json` media types.
pub fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
        })
        .unwrap_or(false)
}

/// Buffer a body, failing with 413 once it exceeds `max_body_size`.
pub async fn read_body(body: Body, max_body_size: usize) -> Result<Bytes, ApiError> {
    axum::body::to_bytes(body, max_body_size)
        .await
        .map_err(|_| ApiError::PayloadTooLarge)
}
