//! Completion provider client.
//!
//! # Responsibilities
//! - Shape a [`ChatRequest`] into a system + user completion call
//! - Enforce the outbound deadline
//! - Classify failures into [`UpstreamError`]
//!
//! # Design Decisions
//! - Single attempt, no retries, no queueing
//! - Error bodies are kept for internal logs only

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::chat::{ChatRequest, Usage};
use crate::config::{ProviderConfig, ProviderKind};
use crate::observability::metrics;
use crate::upstream::error::UpstreamError;
use crate::upstream::types::{CompletionRequest, CompletionResponse, Message, STOP_SEQUENCES};

/// Longest slice of an error body kept for logging.
const MAX_ERROR_BODY: usize = 512;

/// A completed upstream call.
#[derive(Debug, Clone)]
pub struct Completion {
    /// Raw (unsanitized) reply text.
    pub reply: String,
    /// Model reported by the provider, if any.
    pub model: Option<String>,
    pub usage: Option<Usage>,
}

/// HTTP client bound to one provider, model and credential.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    provider: ProviderKind,
    model: String,
    max_tokens: u32,
    system_prompt: String,
    timeout: Duration,
}

impl UpstreamClient {
    /// Build a client for the configured provider.
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Result<Self, UpstreamError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("secure-chat-proxy/", env!("CARGO_PKG_VERSION"))),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(UpstreamError::Network)?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url().trim_end_matches('/')),
            api_key: config.api_key.clone(),
            provider: config.kind,
            model: config.model().to_string(),
            max_tokens: config.max_tokens,
            system_prompt: config.system_prompt.clone(),
            timeout,
        })
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Issue one completion call.
    pub async fn complete(&self, request: &ChatRequest) -> Result<Completion, UpstreamError> {
        let start = Instant::now();
        let result = self.send(request).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        metrics::record_upstream(self.provider.display_name(), outcome, start);

        result
    }

    async fn send(&self, request: &ChatRequest) -> Result<Completion, UpstreamError> {
        let body = CompletionRequest {
            model: &self.model,
            messages: vec![
                Message::system(&self.system_prompt),
                Message::user(request.message()),
            ],
            temperature: request.temperature(),
            max_tokens: self.max_tokens,
            top_p: 1.0,
            stream: false,
            stop: &STOP_SEQUENCES,
        };

        tracing::debug!(
            endpoint = %self.endpoint,
            model = %self.model,
            temperature = body.temperature,
            message_len = request.message().chars().count(),
            "Sending completion request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(UpstreamError::from_status(status.as_u16(), truncate(text)));
        }

        let parsed: CompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Timeout(self.timeout)
            } else {
                UpstreamError::InvalidResponse(e.to_string())
            }
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::InvalidResponse("response contained no choices".into()))?;

        Ok(Completion {
            reply: choice.message.content.unwrap_or_default(),
            model: parsed.model,
            usage: parsed.usage,
        })
    }

    fn classify(&self, error: reqwest::Error) -> UpstreamError {
        if error.is_timeout() {
            UpstreamError::Timeout(self.timeout)
        } else {
            UpstreamError::Network(error)
        }
    }
}

fn truncate(mut text: String) -> String {
    if text.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}
