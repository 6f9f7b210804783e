//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (`http_request` span per request)
//! 3. Request ID (recorded on the span, echoed in the response)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//! 5. Security headers
//! 6. Rate limiting (governor) on auth and cart routes only

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};
pub use rate_limit::{auth_rate_limiter, cart_rate_limiter};
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
