//! Error responses.
//!
//! # Responsibilities
//! - Map every failure in the pipeline to a status code and JSON body
//! - Keep upstream and internal detail out of client-facing messages
//!
//! # Design Decisions
//! - Upstream auth failures surface as a generic 500
//! - Error bodies carry a timestamp; upstream errors also carry the request ID

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::upstream::UpstreamError;

/// Paths advertised on 404.
pub const AVAILABLE_ENDPOINTS: [&str; 4] = ["/", "/health", "/api/chat", "/api/models"];

/// JSON error body shared by every failure.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_endpoints: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            retry_after: None,
            available_endpoints: None,
            timestamp: None,
            request_id: None,
        }
    }

    fn stamped(mut self) -> Self {
        self.timestamp = Some(now_iso8601());
        self
    }
}

/// ISO-8601 UTC timestamp with millisecond precision.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Every way a request can fail.
#[derive(Debug)]
pub enum ApiError {
    /// Field rules violated.
    Validation(Vec<String>),
    /// Message reduced to nothing by sanitization.
    EmptyMessage,
    /// Body was not a JSON object.
    MalformedBody(String),
    PayloadTooLarge,
    RateLimited {
        message: String,
        retry_after: String,
        retry_after_secs: u64,
    },
    Upstream {
        error: UpstreamError,
        request_id: String,
    },
    NotFound,
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::EmptyMessage | ApiError::MalformedBody(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Upstream { error, .. } => match error {
                UpstreamError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
                UpstreamError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                UpstreamError::BadRequest(_) => StatusCode::BAD_REQUEST,
                UpstreamError::Unauthorized { .. }
                | UpstreamError::Status { .. }
                | UpstreamError::Network(_)
                | UpstreamError::InvalidResponse(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(self) -> ErrorBody {
        match self {
            ApiError::Validation(details) => ErrorBody {
                details: Some(details),
                ..ErrorBody::new("Invalid input")
            },
            ApiError::EmptyMessage => {
                ErrorBody::new("Message is required and cannot be empty").stamped()
            }
            ApiError::MalformedBody(_) => ErrorBody::new("Invalid JSON body").stamped(),
            ApiError::PayloadTooLarge => ErrorBody::new("Request body too large").stamped(),
            ApiError::RateLimited { message, retry_after, .. } => ErrorBody {
                retry_after: Some(retry_after),
                ..ErrorBody::new(message)
            },
            ApiError::Upstream { error, request_id } => ErrorBody {
                request_id: Some(request_id),
                ..ErrorBody::new(upstream_message(&error)).stamped()
            },
            ApiError::NotFound => ErrorBody {
                available_endpoints: Some(AVAILABLE_ENDPOINTS.to_vec()),
                ..ErrorBody::new("Endpoint not found")
            },
            ApiError::Internal => ErrorBody::new("Internal server error").stamped(),
        }
    }
}

fn upstream_message(error: &UpstreamError) -> &'static str {
    match error {
        UpstreamError::Timeout(_) => "Request timeout. Please try again.",
        UpstreamError::Unauthorized { .. } => "Authentication failed. Please try again later.",
        UpstreamError::RateLimited(_) => "Service is busy. Please try again in a moment.",
        UpstreamError::BadRequest(_) => "Invalid request format. Please check your input.",
        UpstreamError::Status { .. }
        | UpstreamError::Network(_)
        | UpstreamError::InvalidResponse(_) => "An error occurred while processing your request.",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let retry_after_secs = match &self {
            ApiError::RateLimited { retry_after_secs, .. } => Some(*retry_after_secs),
            _ => None,
        };

        let mut response = (status, Json(self.body())).into_response();
        if let Some(secs) = retry_after_secs {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn upstream(error: UpstreamError) -> ApiError {
        ApiError::Upstream { error, request_id: "req-1".into() }
    }

    #[test]
    fn test_upstream_status_mapping() {
        assert_eq!(
            upstream(UpstreamError::Timeout(Duration::from_secs(30))).status(),
            StatusCode::REQUEST_TIMEOUT
        );
        assert_eq!(
            upstream(UpstreamError::Unauthorized { status: 401, body: String::new() }).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            upstream(UpstreamError::RateLimited(String::new())).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            upstream(UpstreamError::BadRequest(String::new())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            upstream(UpstreamError::InvalidResponse("no choices".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_failure_hides_detail() {
        let body = upstream(UpstreamError::Unauthorized {
            status: 401,
            body: "invalid api key gsk_123".into(),
        })
        .body();
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("gsk_123"));
        assert!(json.contains("Authentication failed"));
        assert!(json.contains("\"request_id\":\"req-1\""));
        assert!(body.timestamp.is_some());
    }

    #[test]
    fn test_validation_body_shape() {
        let body = ApiError::Validation(vec!["bad".into()]).body();
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value, serde_json::json!({"error": "Invalid input", "details": ["bad"]}));
    }

    #[test]
    fn test_rate_limited_sets_retry_after_header() {
        let response = ApiError::RateLimited {
            message: "slow down".into(),
            retry_after: "1 minute".into(),
            retry_after_secs: 42,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "42");
    }
}
