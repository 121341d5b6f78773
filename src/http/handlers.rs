//! Route handlers.

use axum::{extract::State, http::HeaderMap, Extension, Json};
use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::chat::{sanitize, validate_chat, ChatRequest, ChatResponse};
use crate::http::request::RequestIdExt;
use crate::http::response::{now_iso8601, ApiError};
use crate::http::server::AppState;
use crate::security::injection::JsonBody;

pub const CAPABILITIES: [&str; 5] = ["chat", "Arabic", "English", "reasoning", "secure"];
pub const SECURITY_FEATURES: [&str; 4] =
    ["input_validation", "xss_protection", "rate_limiting", "sanitization"];

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    tracing::debug!("Health check requested");
    Json(json!({
        "status": "Server is running",
        "port": state.config.listener.port,
        "ai_provider": state.upstream.provider().display_name(),
        "model": state.upstream.model(),
        "version": env!("CARGO_PKG_VERSION"),
        "security": "enhanced",
        "timestamp": now_iso8601(),
    }))
}

/// `GET /api/models`
pub async fn models(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "current_model": state.upstream.model(),
        "provider": state.upstream.provider().display_name(),
        "capabilities": CAPABILITIES,
        "max_tokens": state.config.provider.max_tokens,
        "security_features": SECURITY_FEATURES,
    }))
}

/// `POST /api/chat`
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Extension<JsonBody>>,
) -> Result<Json<ChatResponse>, ApiError> {
    let request_id = headers.request_id_or_new();

    let payload = payload_object(body)?;

    let fields = validate_chat(&payload, state.config.chat.default_temperature).map_err(|details| {
        tracing::info!(request_id = %request_id, violations = ?details, "Rejected chat input");
        ApiError::Validation(details)
    })?;

    let message = sanitize(&fields.message);
    if message.is_empty() {
        return Err(ApiError::EmptyMessage);
    }
    let request = ChatRequest::new(message, fields.temperature);

    tracing::info!(
        request_id = %request_id,
        message_len = request.message().chars().count(),
        temperature = request.temperature(),
        "Forwarding chat request"
    );

    let completion = state.upstream.complete(&request).await.map_err(|error| {
        tracing::error!(
            request_id = %request_id,
            kind = error.kind(),
            error = %error,
            "Upstream completion failed"
        );
        ApiError::Upstream { error, request_id: request_id.clone() }
    })?;

    if let Some(reported) = completion.model.as_deref() {
        if reported != state.upstream.model() {
            tracing::debug!(
                request_id = %request_id,
                configured = state.upstream.model(),
                reported,
                "Provider answered with a different model"
            );
        }
    }

    let reply = sanitize(&completion.reply);
    tracing::info!(
        request_id = %request_id,
        reply_len = reply.chars().count(),
        total_tokens = completion.usage.as_ref().map(|u| u.total_tokens),
        "Chat reply relayed"
    );

    Ok(Json(ChatResponse {
        reply,
        model: state.upstream.model().to_string(),
        provider: state.upstream.provider().display_name().to_string(),
        tokens_used: completion.usage,
        response_time: Utc::now().timestamp_millis(),
        security_level: "enhanced".to_string(),
    }))
}

/// Fallback for unmatched routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

// Non-JSON and empty bodies carry no `JsonBody`; they read as `{}` so the
// field rules report what is missing.
fn payload_object(body: Option<Extension<JsonBody>>) -> Result<Map<String, Value>, ApiError> {
    match body {
        None => Ok(Map::new()),
        Some(Extension(JsonBody(Value::Object(map)))) => Ok(map),
        Some(_) => Err(ApiError::MalformedBody("expected a JSON object".into())),
    }
}
