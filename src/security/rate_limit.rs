//! Fixed-window rate limiting keyed by client address.
//!
//! Counters live behind [`CounterStore`] so the limiter can be handed an
//! isolated store in tests or a shared one in a multi-instance deployment.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use crate::config::WindowConfig;
use crate::http::response::ApiError;
use crate::observability::metrics;

/// Expired windows are swept after this many checks.
const PURGE_EVERY: u64 = 1024;

pub const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
pub const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
pub const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Outcome of a single counter update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowDecision {
    pub allowed: bool,
    /// Hits counted in the current window, including this one if allowed.
    pub count: u32,
    pub limit: u32,
    /// Time until the window resets.
    pub reset_in: Duration,
}

impl WindowDecision {
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.count)
    }

    /// Whole seconds until reset, rounded up.
    pub fn reset_secs(&self) -> u64 {
        let secs = self.reset_in.as_secs();
        if self.reset_in.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }
}

/// Storage for per-client window counters.
pub trait CounterStore: Send + Sync {
    /// Count a hit for `key` unless it already reached `limit` in the
    /// current window. Rejected hits are not counted.
    fn try_acquire(&self, key: &str, limit: u32, window: Duration, now: Instant) -> WindowDecision;

    /// Drop windows that ended before `now`. Returns how many were removed.
    fn purge_expired(&self, now: Instant) -> usize;

    /// Number of tracked clients.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
struct Window {
    count: u32,
    reset_at: Instant,
}

/// In-process counter store. Each key is updated under its map shard lock.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    windows: DashMap<String, Window>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterStore for MemoryCounterStore {
    fn try_acquire(&self, key: &str, limit: u32, window: Duration, now: Instant) -> WindowDecision {
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| Window { count: 0, reset_at: now + window });

        if now >= entry.reset_at {
            entry.count = 0;
            entry.reset_at = now + window;
        }

        let allowed = entry.count < limit;
        if allowed {
            entry.count += 1;
        }

        WindowDecision {
            allowed,
            count: entry.count,
            limit,
            reset_in: entry.reset_at.saturating_duration_since(now),
        }
    }

    fn purge_expired(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, w| w.reset_at > now);
        before.saturating_sub(self.windows.len())
    }

    fn len(&self) -> usize {
        self.windows.len()
    }
}

/// A named fixed-window limit over a counter store.
pub struct FixedWindowLimiter {
    name: &'static str,
    limit: u32,
    window: Duration,
    message: String,
    retry_hint: String,
    store: Arc<dyn CounterStore>,
    checks: AtomicU64,
}

impl FixedWindowLimiter {
    pub fn new(name: &'static str, config: &WindowConfig, store: Arc<dyn CounterStore>) -> Self {
        Self {
            name,
            limit: config.max_requests,
            window: Duration::from_secs(config.window_secs),
            message: config.message.clone(),
            retry_hint: config.retry_after.clone(),
            store,
            checks: AtomicU64::new(0),
        }
    }

    /// Limiter backed by its own [`MemoryCounterStore`].
    pub fn in_memory(name: &'static str, config: &WindowConfig) -> Self {
        Self::new(name, config, Arc::new(MemoryCounterStore::new()))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn store(&self) -> &Arc<dyn CounterStore> {
        &self.store
    }

    pub fn check(&self, key: &str) -> WindowDecision {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> WindowDecision {
        let checks = self.checks.fetch_add(1, Ordering::Relaxed) + 1;
        if checks % PURGE_EVERY == 0 {
            let purged = self.store.purge_expired(now);
            if purged > 0 {
                tracing::debug!(limiter = self.name, purged, "Purged expired rate limit windows");
            }
        }
        self.store.try_acquire(key, self.limit, self.window, now)
    }

    fn rejection(&self, decision: &WindowDecision) -> ApiError {
        ApiError::RateLimited {
            message: self.message.clone(),
            retry_after: self.retry_hint.clone(),
            retry_after_secs: decision.reset_secs(),
        }
    }
}

/// Client key for limiting: the peer IP, or `unknown` without connect info.
pub fn client_key(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware function for fixed-window rate limiting.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<FixedWindowLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let key = client_key(&request);
    let decision = limiter.check(&key);

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        tracing::warn!(
            client = %key,
            limiter = limiter.name(),
            limit = decision.limit,
            reset_secs = decision.reset_secs(),
            "Rate limit exceeded"
        );
        metrics::record_rate_limited(limiter.name());
        limiter.rejection(&decision).into_response()
    };

    set_rate_limit_headers(response.headers_mut(), &decision);
    response
}

// The innermost limiter's headers win.
fn set_rate_limit_headers(headers: &mut HeaderMap, decision: &WindowDecision) {
    if headers.contains_key(&RATELIMIT_LIMIT) {
        return;
    }
    headers.insert(RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(RATELIMIT_REMAINING, HeaderValue::from(decision.remaining()));
    headers.insert(RATELIMIT_RESET, HeaderValue::from(decision.reset_secs()));
}
