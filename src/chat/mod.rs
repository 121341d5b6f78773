//! Chat domain: payload validation, sanitization and the types sent to and
//! returned from `POST /api/chat`.
//!
//! # Data Flow
//! ```text
//! JSON body (injection-guarded)
//!     → validate.rs (declarative field rules, all violations reported)
//!     → sanitize.rs (strip markup from the message)
//!     → ChatRequest (temperature clamped)
//!     → upstream client
//!     → sanitize.rs (strip markup from the reply)
//!     → ChatResponse
//! ```

pub mod sanitize;
pub mod types;
pub mod validate;

pub use sanitize::sanitize;
pub use types::{ChatRequest, ChatResponse, Usage};
pub use validate::{validate_chat, ChatFields};
