//! Upstream completion provider subsystem (Groq, x.ai).
//!
//! # Data Flow
//! ```text
//! ChatRequest
//!     → client.rs (shape request, bearer auth, deadline)
//!     → provider /chat/completions
//!     → types.rs (decode choices + usage)
//!     → error.rs (classify non-2xx, timeout, network)
//! ```

pub mod client;
pub mod error;
pub mod types;

pub use client::{Completion, UpstreamClient};
pub use error::UpstreamError;
