//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (`http_request` span per request)
//! 3. Session layer (tower-sessions with `PostgreSQL` store, `SameSite=Strict`)
//! 4. Security headers
//!
//! Admin checks happen per handler through the [`RequireAdminAuth`]
//! extractor rather than a guard layer, so `/auth/*` and `/health` stay open.

pub mod auth;
pub mod security_headers;
pub mod session;

pub use auth::{
    AdminAuthRejection, OptionalAdminAuth, RequireAdminAuth, clear_current_admin,
    set_current_admin,
};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
