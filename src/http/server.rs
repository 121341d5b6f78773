//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up the middleware chain in pipeline order
//! - Bind server to listener
//! - Drain in-flight requests on shutdown
//!
//! # Layer Order (outermost first)
//! ```text
//! request id → trace → request id echo → panic catcher → timeout
//!     → security headers → CORS → metrics → global limiter → body limit
//!     → JSON guard → [chat limiter] → handler
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, MatchedPath},
    http::{header, HeaderValue, Request},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, get_service, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    services::ServeFile,
    set_header::{SetResponseHeader, SetResponseHeaderLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::handlers;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::http::response::ApiError;
use crate::observability::metrics;
use crate::security::headers::{apply_security_headers, cors_layer};
use crate::security::injection::json_body_guard;
use crate::security::limits::body_limit_layer;
use crate::security::rate_limit::{rate_limit_middleware, FixedWindowLimiter};
use crate::upstream::{UpstreamClient, UpstreamError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub upstream: Arc<UpstreamClient>,
}

/// The two limiters in the pipeline. `None` disables one.
#[derive(Clone, Default)]
pub struct Limiters {
    pub global: Option<Arc<FixedWindowLimiter>>,
    pub chat: Option<Arc<FixedWindowLimiter>>,
}

impl Limiters {
    /// In-memory limiters from configuration.
    pub fn from_config(config: &GatewayConfig) -> Self {
        if !config.rate_limit.enabled {
            return Self::default();
        }
        Self {
            global: Some(Arc::new(FixedWindowLimiter::in_memory(
                "global",
                &config.rate_limit.global,
            ))),
            chat: Some(Arc::new(FixedWindowLimiter::in_memory(
                "chat",
                &config.rate_limit.chat,
            ))),
        }
    }
}

/// HTTP server for the chat gateway.
pub struct HttpServer {
    router: Router,
    config: Arc<GatewayConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with in-memory rate limiting.
    pub fn new(config: GatewayConfig) -> Result<Self, UpstreamError> {
        let limiters = Limiters::from_config(&config);
        Self::with_limiters(config, limiters)
    }

    /// Create a server with caller-supplied limiters.
    pub fn with_limiters(config: GatewayConfig, limiters: Limiters) -> Result<Self, UpstreamError> {
        let upstream = UpstreamClient::new(
            &config.provider,
            Duration::from_secs(config.timeouts.upstream_secs),
        )?;
        Ok(Self::with_upstream(config, upstream, limiters))
    }

    /// Create a server around an already-built upstream client.
    pub fn with_upstream(config: GatewayConfig, upstream: UpstreamClient, limiters: Limiters) -> Self {
        let config = Arc::new(config);
        let state = AppState {
            config: config.clone(),
            upstream: Arc::new(upstream),
        };
        let router = Self::build_router(&config, state, limiters);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState, limiters: Limiters) -> Router {
        let mut chat_route = post(handlers::chat);
        if let Some(chat) = limiters.chat {
            chat_route = chat_route.layer(middleware::from_fn_with_state(chat, rate_limit_middleware));
        }

        let max_body = config.security.max_body_size;
        let mut router = Router::new()
            .route("/health", get(handlers::health))
            .route("/api/models", get(handlers::models))
            .route("/api/chat", chat_route)
            .route("/", get_service(landing_page(&config.listener.static_dir)))
            .fallback(handlers::not_found)
            .method_not_allowed_fallback(handlers::not_found)
            .with_state(state)
            .layer(middleware::from_fn_with_state(max_body, json_body_guard))
            .layer(DefaultBodyLimit::disable())
            .layer(body_limit_layer(max_body));

        if let Some(global) = limiters.global {
            router = router.layer(middleware::from_fn_with_state(global, rate_limit_middleware));
        }
        router = router.layer(middleware::from_fn(track_metrics));

        router = router.layer(cors_layer(
            config.listener.environment,
            &config.security.cors_origins,
        ));
        router = apply_security_headers(router, &config.security);

        router
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = request.headers().request_id().unwrap_or("-"),
                )
            }))
            .layer(set_request_id_layer())
    }

    /// Router handle, for driving the pipeline without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            provider = self.config.provider.kind.display_name(),
            model = self.config.provider.model(),
            environment = self.config.listener.environment.as_str(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

fn landing_page(static_dir: &str) -> LandingPage {
    ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        ))
        .service(ServeFile::new(Path::new(static_dir).join("index.html")))
}

type LandingPage = SetResponseHeader<ServeFile, HeaderValue>;

async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    metrics::record_request(&method, &path, response.status().as_u16(), start);
    response
}

fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    tracing::error!(panic = %detail, "Unhandled error while serving request");

    ApiError::Internal.into_response()
}
