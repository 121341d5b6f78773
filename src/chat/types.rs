//! Chat request/response types exchanged with clients.

use serde::{Deserialize, Serialize};

/// Lowest temperature forwarded upstream.
pub const MIN_TEMPERATURE: f64 = 0.0;
/// Highest temperature forwarded upstream.
pub const MAX_TEMPERATURE: f64 = 1.0;

/// A validated, sanitized chat request ready for the upstream provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    message: String,
    temperature: f64,
}

impl ChatRequest {
    /// Build a request. The temperature is clamped into `[0, 1]`.
    pub fn new(message: impl Into<String>, temperature: f64) -> Self {
        Self {
            message: message.into(),
            temperature: clamp_temperature(temperature),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }
}

/// Clamp into `[0, 1]`. NaN collapses to the lower bound.
pub fn clamp_temperature(value: f64) -> f64 {
    if value.is_nan() {
        return MIN_TEMPERATURE;
    }
    value.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE)
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// Successful `POST /api/chat` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub model: String,
    pub provider: String,
    pub tokens_used: Option<Usage>,
    /// Unix epoch milliseconds.
    pub response_time: i64,
    pub security_level: String,
}
