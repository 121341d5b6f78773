//! Operator-key stripping for JSON bodies.
//!
//! Keys that start with `$` or contain `.` can change the meaning of a query
//! if a body is ever handed to a document store. They are removed at every
//! depth before any handler sees the payload. The cleaned document is left
//! in the request extensions as [`JsonBody`] so it is parsed only once.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::http::response::ApiError;
use crate::security::limits::{is_json_content_type, read_body};

/// A JSON request body that passed the guard, operator keys removed.
#[derive(Debug, Clone)]
pub struct JsonBody(pub Value);

/// Remove operator-looking keys in place. Returns how many were dropped.
pub fn strip_operator_keys(value: &mut Value) -> usize {
    match value {
        Value::Object(map) => {
            let before = map.len();
            map.retain(|key, _| !is_operator_key(key));
            let mut removed = before - map.len();
            for child in map.values_mut() {
                removed += strip_operator_keys(child);
            }
            removed
        }
        Value::Array(items) => items.iter_mut().map(strip_operator_keys).sum(),
        _ => 0,
    }
}

fn is_operator_key(key: &str) -> bool {
    key.starts_with('$') || key.contains('.')
}

/// Middleware that parses JSON bodies under the size limit and strips
/// operator keys. Non-JSON and empty bodies pass through untouched.
pub async fn json_body_guard(
    State(max_body_size): State<usize>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !is_json_content_type(request.headers()) {
        return next.run(request).await;
    }

    let (mut parts, body) = request.into_parts();
    let bytes = match read_body(body, max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => return e.into_response(),
    };

    if bytes.is_empty() {
        return next.run(Request::from_parts(parts, Body::empty())).await;
    }

    let mut value: Value = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "Rejecting malformed JSON body");
            return ApiError::MalformedBody(e.to_string()).into_response();
        }
    };

    let removed = strip_operator_keys(&mut value);
    let body = if removed > 0 {
        tracing::warn!(removed, path = %parts.uri.path(), "Stripped operator keys from request body");
        match serde_json::to_vec(&value) {
            Ok(cleaned) => {
                parts
                    .headers
                    .insert(header::CONTENT_LENGTH, HeaderValue::from(cleaned.len()));
                Body::from(cleaned)
            }
            Err(_) => return ApiError::Internal.into_response(),
        }
    } else {
        Body::from(bytes)
    };

    parts.extensions.insert(JsonBody(value));
    next.run(Request::from_parts(parts, body)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, middleware, routing::post, Extension, Json, Router};
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt;

    #[test]
    fn test_strips_nested_operator_keys() {
        let mut value = json!({
            "message": "hi",
            "$where": "sleep(1000)",
            "profile.admin": true,
            "filter": {"$gt": "", "name": "x"},
            "items": [{"$ne": 1, "keep": 2}]
        });

        let removed = strip_operator_keys(&mut value);
        assert_eq!(removed, 4);
        assert_eq!(
            value,
            json!({"message": "hi", "filter": {"name": "x"}, "items": [{"keep": 2}]})
        );
    }

    async fn echo(Extension(JsonBody(value)): Extension<JsonBody>) -> Json<Value> {
        Json(value)
    }

    fn guarded() -> Router {
        Router::new()
            .route("/", post(echo))
            .layer(middleware::from_fn_with_state(1024usize, json_body_guard))
    }

    fn json_request(body: &str) -> Request<Body> {
        Request::post("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_guard_hands_cleaned_document_to_handler() {
        let response = guarded()
            .oneshot(json_request(r#"{"message":"hi","$ne":1,"a.b":2}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let echoed: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(echoed, json!({"message": "hi"}));
    }

    #[tokio::test]
    async fn test_guard_rejects_malformed_json() {
        let response = guarded().oneshot(json_request("{\"message\":")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_values_are_not_touched() {
        let mut value = json!({"message": "price is $5.00", "temperature": 0.5});
        assert_eq!(strip_operator_keys(&mut value), 0);
        assert_eq!(value["message"], "price is $5.00");
    }
}
