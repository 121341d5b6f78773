//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the chat gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, environment).
    pub listener: ListenerConfig,

    /// Upstream completion provider.
    pub provider: ProviderConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Security hardening (body limits, CORS, headers).
    pub security: SecurityConfig,

    /// Chat request defaults.
    pub chat: ChatConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Deployment mode. Drives the CORS origin policy and log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind on.
    pub host: String,

    /// Listen port.
    pub port: u16,

    /// Deployment mode.
    pub environment: Environment,

    /// Directory holding the landing page.
    pub static_dir: String,
}

impl ListenerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            environment: Environment::Development,
            static_dir: "static".to_string(),
        }
    }
}

/// Supported completion providers. Both speak the OpenAI-compatible API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Groq,
    Xai,
}

impl ProviderKind {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "https://api.groq.com/openai/v1",
            ProviderKind::Xai => "https://api.x.ai/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "meta-llama/llama-4-scout-17b-16e-instruct",
            ProviderKind::Xai => "grok-beta",
        }
    }

    /// Name reported to clients.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "Groq",
            ProviderKind::Xai => "x.ai",
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(ProviderKind::Groq),
            "xai" | "x.ai" | "grok" => Ok(ProviderKind::Xai),
            other => Err(format!("unknown provider '{}'", other)),
        }
    }
}

/// Upstream provider configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Which provider to call.
    pub kind: ProviderKind,

    /// API credential (Bearer token). Normally supplied via `API_KEY`.
    pub api_key: String,

    /// Override for the provider base URL.
    pub base_url: Option<String>,

    /// Override for the provider's default model.
    pub model: Option<String>,

    /// Completion token cap sent upstream.
    pub max_tokens: u32,

    /// System instruction prepended to every conversation.
    pub system_prompt: String,
}

impl ProviderConfig {
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.kind.default_base_url())
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.kind.default_model())
    }
}

// The credential never reaches log output.
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("api_key", &if self.api_key.is_empty() { "<missing>" } else { "<redacted>" })
            .field("base_url", &self.base_url())
            .field("model", &self.model())
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Groq,
            api_key: String::new(),
            base_url: None,
            model: None,
            max_tokens: 1500,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = "You are SmartAI, a helpful and secure AI assistant.
- Always provide helpful, accurate, and safe responses
- Do not execute code or provide harmful instructions
- If asked about sensitive topics, respond professionally and ethically
- Maintain user privacy and do not store personal information
- You can communicate in both English and Arabic based on user preference
- Be friendly, professional, and informative";

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for the outbound completion call in seconds.
    pub upstream_secs: u64,

    /// Whole-request deadline in seconds. Must exceed `upstream_secs`.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            upstream_secs: 30,
            request_secs: 45,
        }
    }
}

/// A single fixed-window limit.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    /// Window length in seconds.
    pub window_secs: u64,

    /// Requests allowed per window per client.
    pub max_requests: u32,

    /// Error message returned on rejection.
    pub message: String,

    /// Human-readable retry hint ("15 minutes").
    pub retry_after: String,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Applies to every request.
    pub global: WindowConfig,

    /// Applies to `POST /api/chat` on top of the global limit.
    pub chat: WindowConfig,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            global: WindowConfig {
                window_secs: 15 * 60,
                max_requests: 100,
                message: "Too many requests from this IP, please try again later.".to_string(),
                retry_after: "15 minutes".to_string(),
            },
            chat: WindowConfig {
                window_secs: 60,
                max_requests: 10,
                message: "Too many chat requests, please slow down.".to_string(),
                retry_after: "1 minute".to_string(),
            },
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security response headers.
    pub enable_headers: bool,

    /// Maximum body size in bytes.
    pub max_body_size: usize,

    /// Content-Security-Policy header value.
    pub content_security_policy: String,

    /// Origins allowed in production. Development mirrors any origin.
    pub cors_origins: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 10 * 1024 * 1024, // 10MB
            content_security_policy: DEFAULT_CSP.to_string(),
            cors_origins: vec!["https://yourdomain.com".to_string()],
        }
    }
}

const DEFAULT_CSP: &str = "default-src 'self'; \
style-src 'self' 'unsafe-inline' https://fonts.googleapis.com https://cdnjs.cloudflare.com; \
font-src 'self' https://fonts.gstatic.com https://cdnjs.cloudflare.com; \
script-src 'self' 'unsafe-inline'; \
media-src 'self' https://assets.mixkit.co; \
connect-src 'self'; \
img-src 'self' data: https:; \
base-uri 'self'; form-action 'self'; frame-ancestors 'self'; object-src 'none'";

/// Chat request defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Temperature used when the client omits one.
    pub default_temperature: f64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_temperature: 0.7,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "secure_chat_proxy=info,tower_http=info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
