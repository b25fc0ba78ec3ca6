//! HTTP middleware for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added by the binary)
//! 2. `TraceLayer` (request tracing)
//! 3. Response headers (no caching, no framing, no sniffing)
//! 4. Session layer (tower-sessions, in-memory store)
//!
//! Authentication is enforced per handler with the [`RequireAdminAuth`]
//! extractor.

pub mod auth;
pub mod session;

pub use auth::{RequireAdminAuth, clear_current_admin, set_current_admin};
pub use session::create_session_layer;
