//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (windows > 0, timeouts ordered)
//! - Reject a missing upstream credential before anything binds
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::HeaderValue;
use thiserror::Error;
use url::Url;

use crate::config::schema::{GatewayConfig, WindowConfig};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("API_KEY is not set; the upstream provider credential is required")]
    MissingApiKey,

    #[error("invalid provider base URL '{0}'")]
    InvalidBaseUrl(String),

    #[error("rate limit '{0}' must have a non-zero window and threshold")]
    InvalidWindow(&'static str),

    #[error("timeouts.upstream_secs must be > 0 and below timeouts.request_secs")]
    InvalidTimeouts,

    #[error("security.max_body_size must be > 0")]
    InvalidBodyLimit,

    #[error("invalid CORS origin '{0}'")]
    InvalidCorsOrigin(String),

    #[error("invalid Content-Security-Policy value")]
    InvalidContentSecurityPolicy,

    #[error("chat.default_temperature must be between 0 and 1")]
    InvalidDefaultTemperature,
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.provider.api_key.trim().is_empty() {
        errors.push(ValidationError::MissingApiKey);
    }

    let base_url = config.provider.base_url();
    match Url::parse(base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        _ => errors.push(ValidationError::InvalidBaseUrl(base_url.to_string())),
    }

    check_window("global", &config.rate_limit.global, &mut errors);
    check_window("chat", &config.rate_limit.chat, &mut errors);

    let timeouts = &config.timeouts;
    if timeouts.upstream_secs == 0 || timeouts.upstream_secs >= timeouts.request_secs {
        errors.push(ValidationError::InvalidTimeouts);
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::InvalidBodyLimit);
    }

    for origin in &config.security.cors_origins {
        if HeaderValue::from_str(origin).is_err() || Url::parse(origin).is_err() {
            errors.push(ValidationError::InvalidCorsOrigin(origin.clone()));
        }
    }

    if HeaderValue::from_str(&config.security.content_security_policy).is_err() {
        errors.push(ValidationError::InvalidContentSecurityPolicy);
    }

    if !(0.0..=1.0).contains(&config.chat.default_temperature) {
        errors.push(ValidationError::InvalidDefaultTemperature);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_window(name: &'static str, window: &WindowConfig, errors: &mut Vec<ValidationError>) {
    if window.window_secs == 0 || window.max_requests == 0 {
        errors.push(ValidationError::InvalidWindow(name));
    }
}
