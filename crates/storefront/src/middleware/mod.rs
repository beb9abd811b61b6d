//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded in the span, echoed in the response)
//! 4. Security headers (CSP and isolation headers)
//! 5. Session layer (tower-sessions, in-memory store)
//! 6. Rate limiting on auth form posts (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{RequireAuth, clear_current_user, set_current_user};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::{SecurityHeaders, security_headers_middleware};
pub use session::{MokaSessionStore, create_session_layer};
