//! HTTP middleware stack for the portal.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, HTTP transactions)
//! 2. Session layer (tower-sessions with `PostgreSQL` store)
//! 3. Security headers
//! 4. `TraceLayer` (request tracing)
//! 5. Request ID (recorded on the trace span)
//! 6. Rate limiting on credential submissions (governor)
//!
//! Page guards are extractors in [`auth`], not layers.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    GuardRejection, OptionalUser, RequireClient, RequireEmployee, RequireSignedIn,
    set_current_user,
};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{PortalSessionLayer, create_session_layer, session_layer};
