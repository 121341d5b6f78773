//! End-to-end tests for the request pipeline, driven through the router.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{header as match_header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use secure_chat_proxy::config::GatewayConfig;
use secure_chat_proxy::http::HttpServer;

mod common;

async fn router_for(upstream: &MockServer) -> Router {
    router_with(common::test_config(&upstream.uri()))
}

fn router_with(config: GatewayConfig) -> Router {
    HttpServer::new(config).unwrap().router()
}

fn chat_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

async fn mount_reply(upstream: &MockServer, reply: &str) {
    Mock::given(method("POST"))
        .and(path(common::COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::completion_body(reply)))
        .mount(upstream)
        .await;
}

async fn mount_status(upstream: &MockServer, status: u16, body: &str) {
    Mock::given(method("POST"))
        .and(path(common::COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(upstream)
        .await;
}

#[tokio::test]
async fn test_chat_success() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::COMPLETIONS_PATH))
        .and(match_header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::completion_body("Hi there")))
        .expect(1)
        .mount(&upstream)
        .await;

    let (status, _, body) = send(router_for(&upstream).await, chat_request(json!({"message": "Hello"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "Hi there");
    assert_eq!(body["provider"], "Groq");
    assert_eq!(body["model"], "meta-llama/llama-4-scout-17b-16e-instruct");
    assert_eq!(body["security_level"], "enhanced");
    assert_eq!(body["tokens_used"]["total_tokens"], 15);
    assert!(body["response_time"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_reply_is_sanitized() {
    let upstream = MockServer::start().await;
    mount_reply(&upstream, "<b>Bold</b> text<script>alert(1)</script>").await;

    let (status, _, body) = send(router_for(&upstream).await, chat_request(json!({"message": "Hello"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "Bold text");
}

#[tokio::test]
async fn test_empty_message_rejected() {
    let upstream = MockServer::start().await;
    let (status, _, body) = send(router_for(&upstream).await, chat_request(json!({"message": "   "}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid input");
    assert_eq!(body["details"][0], "Message must be between 1 and 2000 characters");
    assert!(upstream.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_message_length_bounds() {
    let upstream = MockServer::start().await;
    mount_reply(&upstream, "ok").await;

    let (status, _, _) = send(
        router_for(&upstream).await,
        chat_request(json!({"message": "a".repeat(2000)})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = send(
        router_for(&upstream).await,
        chat_request(json!({"message": "a".repeat(2001)})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0], "Message must be between 1 and 2000 characters");
}

#[tokio::test]
async fn test_out_of_range_temperature_rejected() {
    let upstream = MockServer::start().await;
    let (status, _, body) = send(
        router_for(&upstream).await,
        chat_request(json!({"message": "Hello", "temperature": 1.5})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0], "Temperature must be between 0 and 1");
}

#[tokio::test]
async fn test_markup_only_message_rejected() {
    let upstream = MockServer::start().await;
    let (status, _, body) = send(
        router_for(&upstream).await,
        chat_request(json!({"message": "<script>alert(1)</script>"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Message is required and cannot be empty");
    assert!(upstream.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_operator_keys_do_not_reach_handler() {
    let upstream = MockServer::start().await;
    mount_reply(&upstream, "ok").await;

    let (status, _, _) = send(
        router_for(&upstream).await,
        chat_request(json!({"message": "Hello", "$where": "1 == 1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let upstream = MockServer::start().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"message\": "))
        .unwrap();

    let (status, _, body) = send(router_for(&upstream).await, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid JSON body");
}

#[tokio::test]
async fn test_json_array_body_rejected() {
    let upstream = MockServer::start().await;
    let (status, _, body) = send(router_for(&upstream).await, chat_request(json!(["Hello"]))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid JSON body");
    assert!(upstream.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_non_json_body_fails_validation() {
    let upstream = MockServer::start().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("message=Hello"))
        .unwrap();

    let (status, _, body) = send(router_for(&upstream).await, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid input");
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let upstream = MockServer::start().await;
    let mut config = common::test_config(&upstream.uri());
    config.security.max_body_size = 64;

    let (status, _, _) = send(
        router_with(config),
        chat_request(json!({"message": "a".repeat(200)})),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_upstream_auth_failure_is_generic() {
    let upstream = MockServer::start().await;
    mount_status(&upstream, 401, r#"{"error":{"message":"Invalid API Key gsk_abc"}}"#).await;

    let (status, _, body) = send(router_for(&upstream).await, chat_request(json!({"message": "Hello"}))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Authentication failed. Please try again later.");
    assert!(body["request_id"].is_string());
    assert!(body["timestamp"].is_string());
    assert!(!body.to_string().contains("gsk_abc"));
}

#[tokio::test]
async fn test_upstream_rate_limited() {
    let upstream = MockServer::start().await;
    mount_status(&upstream, 429, "slow down").await;

    let (status, _, body) = send(router_for(&upstream).await, chat_request(json!({"message": "Hello"}))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Service is busy. Please try again in a moment.");
}

#[tokio::test]
async fn test_upstream_bad_request() {
    let upstream = MockServer::start().await;
    mount_status(&upstream, 400, "bad").await;

    let (status, _, body) = send(router_for(&upstream).await, chat_request(json!({"message": "Hello"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request format. Please check your input.");
}

#[tokio::test]
async fn test_upstream_server_error() {
    let upstream = MockServer::start().await;
    mount_status(&upstream, 503, "down").await;

    let (status, _, body) = send(router_for(&upstream).await, chat_request(json!({"message": "Hello"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "An error occurred while processing your request.");
}

#[tokio::test]
async fn test_upstream_timeout() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::COMPLETIONS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::completion_body("late"))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&upstream)
        .await;

    let mut config = common::test_config(&upstream.uri());
    config.timeouts.upstream_secs = 1;
    config.timeouts.request_secs = 10;

    let (status, _, body) = send(router_with(config), chat_request(json!({"message": "Hello"}))).await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body["error"], "Request timeout. Please try again.");
}

#[tokio::test]
async fn test_health() {
    let upstream = MockServer::start().await;
    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (status, _, body) = send(router_for(&upstream).await, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Server is running");
    assert_eq!(body["ai_provider"], "Groq");
    assert_eq!(body["security"], "enhanced");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_models() {
    let upstream = MockServer::start().await;
    let request = Request::get("/api/models").body(Body::empty()).unwrap();
    let (status, _, body) = send(router_for(&upstream).await, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_model"], "meta-llama/llama-4-scout-17b-16e-instruct");
    assert_eq!(body["max_tokens"], 1500);
    assert_eq!(body["capabilities"].as_array().unwrap().len(), 5);
    assert_eq!(body["security_features"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_xai_provider_reported() {
    let upstream = MockServer::start().await;
    let mut config = common::test_config(&upstream.uri());
    config.provider.kind = "xai".parse().unwrap();

    let request = Request::get("/api/models").body(Body::empty()).unwrap();
    let (_, _, body) = send(router_with(config), request).await;
    assert_eq!(body["provider"], "x.ai");
    assert_eq!(body["current_model"], "grok-beta");
}

#[tokio::test]
async fn test_unknown_route() {
    let upstream = MockServer::start().await;
    let request = Request::get("/admin").body(Body::empty()).unwrap();
    let (status, _, body) = send(router_for(&upstream).await, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Endpoint not found");
    assert_eq!(
        body["available_endpoints"],
        json!(["/", "/health", "/api/chat", "/api/models"])
    );
}

#[tokio::test]
async fn test_wrong_method_gets_endpoint_list() {
    let upstream = MockServer::start().await;
    let router = router_for(&upstream).await;

    for (verb, uri) in [("GET", "/api/chat"), ("POST", "/health"), ("POST", "/"), ("DELETE", "/api/models")] {
        let request = Request::builder().method(verb).uri(uri).body(Body::empty()).unwrap();
        let (status, _, body) = send(router.clone(), request).await;

        assert_eq!(status, StatusCode::NOT_FOUND, "{verb} {uri}");
        assert_eq!(body["error"], "Endpoint not found");
        assert_eq!(body["available_endpoints"].as_array().unwrap().len(), 4);
    }
    assert!(upstream.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_landing_page() {
    let upstream = MockServer::start().await;
    let response = router_for(&upstream)
        .await
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
}

#[tokio::test]
async fn test_security_headers_and_request_id() {
    let upstream = MockServer::start().await;
    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (_, headers, _) = send(router_for(&upstream).await, request).await;

    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
    assert!(headers.contains_key("x-request-id"));
    assert!(headers.contains_key("ratelimit-limit"));
}

#[tokio::test]
async fn test_caller_request_id_is_echoed() {
    let upstream = MockServer::start().await;
    let request = Request::get("/health")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send(router_for(&upstream).await, request).await;
    assert_eq!(headers["x-request-id"], "abc-123");
}

#[tokio::test]
async fn test_development_cors_mirrors_origin() {
    let upstream = MockServer::start().await;
    let request = Request::get("/health")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send(router_for(&upstream).await, request).await;

    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:3000");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}
