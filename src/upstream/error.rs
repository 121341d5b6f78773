//! Upstream failure taxonomy.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while calling the completion provider.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The call exceeded its deadline.
    #[error("upstream timed out after {0:?}")]
    Timeout(Duration),

    /// The provider rejected our credential (401/403).
    #[error("upstream rejected credentials with status {status}: {body}")]
    Unauthorized { status: u16, body: String },

    /// The provider throttled us (429).
    #[error("upstream rate limited the request: {0}")]
    RateLimited(String),

    /// The provider rejected the shaped request (400).
    #[error("upstream rejected the request: {0}")]
    BadRequest(String),

    /// Any other non-2xx status.
    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection-level failure.
    #[error("upstream network error: {0}")]
    Network(#[source] reqwest::Error),

    /// 2xx response that could not be interpreted.
    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),
}

impl UpstreamError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Timeout(_) => "timeout",
            UpstreamError::Unauthorized { .. } => "unauthorized",
            UpstreamError::RateLimited(_) => "rate_limited",
            UpstreamError::BadRequest(_) => "bad_request",
            UpstreamError::Status { .. } => "status",
            UpstreamError::Network(_) => "network",
            UpstreamError::InvalidResponse(_) => "invalid_response",
        }
    }

    /// Classify a non-success status and its (truncated) body.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => UpstreamError::Unauthorized { status, body },
            429 => UpstreamError::RateLimited(body),
            400 => UpstreamError::BadRequest(body),
            _ => UpstreamError::Status { status, body },
        }
    }
}
