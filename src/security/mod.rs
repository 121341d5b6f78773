//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (CORS, hardening response headers)
//!     → rate_limit.rs (global per-IP window)
//!     → limits.rs (body size limit)
//!     → injection.rs (parse JSON, strip operator keys)
//!     → rate_limit.rs (chat route window)
//!     → handler (field validation, sanitization)
//! ```
//!
//! # Design Decisions
//! - Defense in depth: multiple layers of protection
//! - Fail closed: reject on any security check failure
//! - No trust in client input

pub mod headers;
pub mod injection;
pub mod limits;
pub mod rate_limit;

pub use rate_limit::{CounterStore, FixedWindowLimiter, MemoryCounterStore, WindowDecision};
