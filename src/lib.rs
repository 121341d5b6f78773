//! Secure Chat Proxy Library
//!
//! An HTTP gateway that accepts chat messages from browsers, screens them,
//! and relays them to an OpenAI-compatible completion API (Groq or x.ai).

pub mod chat;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod upstream;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
