//! Secure Chat Proxy
//!
//! A hardened chat gateway built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//! browser
//!   → security headers + CORS
//!   → global rate limiter (per IP)
//!   → body limit + JSON guard
//!   → chat rate limiter (per IP)
//!   → field validation → sanitize
//!   → upstream client ────────▶ Groq / x.ai
//!   ◀ sanitize reply ◀─────────
//!
//! alongside: config, observability, lifecycle
//! ```

use std::path::PathBuf;

use clap::Parser;

use secure_chat_proxy::config::{load_config, GatewayConfig};
use secure_chat_proxy::lifecycle::{signals, startup};
use secure_chat_proxy::observability::logging::init_logging;
use secure_chat_proxy::Shutdown;

#[derive(Parser)]
#[command(name = "secure-chat-proxy")]
#[command(about = "Hardened gateway for Groq and x.ai chat completions", long_about = None)]
struct Args {
    /// Optional TOML configuration file. Environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            let fallback = GatewayConfig::default();
            init_logging(&fallback.observability, fallback.listener.environment);
            tracing::error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    init_logging(&config.observability, config.listener.environment);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        provider = config.provider.kind.display_name(),
        model = config.provider.model(),
        port = config.listener.port,
        environment = config.listener.environment.as_str(),
        "secure-chat-proxy starting"
    );
    tracing::debug!(config = ?config, "Configuration loaded");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    if let Err(e) = startup::run(config, &shutdown).await {
        tracing::error!(error = %e, "Gateway terminated with an error");
        std::process::exit(1);
    }
}
