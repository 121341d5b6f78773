//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use serde_json::{json, Value};
use secure_chat_proxy::config::GatewayConfig;
use secure_chat_proxy::http::HttpServer;
use secure_chat_proxy::lifecycle::{startup, Shutdown};

/// Config pointing at a mock provider mounted under `/v1`.
pub fn test_config(upstream_uri: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.listener.static_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/static").into();
    config.provider.api_key = "test-key".into();
    config.provider.base_url = Some(format!("{upstream_uri}/v1"));
    config.observability.metrics_enabled = false;
    config
}

/// Upstream path the client posts to.
pub const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// OpenAI-compatible success body.
pub fn completion_body(reply: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "model": "meta-llama/llama-4-scout-17b-16e-instruct",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": reply},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
    })
}

/// Start a gateway on an ephemeral port and return its address.
pub async fn spawn_gateway(config: GatewayConfig, shutdown: &Shutdown) -> SocketAddr {
    let server = HttpServer::new(config).expect("upstream client");
    let listener = startup::bind(server.config()).await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    addr
}

/// Client that never pools or proxies, so every request is a fresh connection.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .expect("client")
}
