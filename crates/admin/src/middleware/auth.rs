//! Authentication middleware and extractors for admin.
//!
//! Provides extractors for requiring admin authentication in route handlers.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use gamestore_store::db::UserRepository;

use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

/// Extractor that requires a signed-in admin.
///
/// The session only proves who is signed in. The account is looked up on
/// every request and must still exist with `is_admin` set, so revoking
/// admin locks the account out immediately.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.email)
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Error returned when admin authentication is required.
#[derive(Debug)]
pub enum AdminAuthRejection {
    /// Nobody is signed in.
    RedirectToLogin,
    /// No session layer in front of the handler.
    Unauthorized,
    /// Signed in, but the account is gone or no longer an admin.
    Forbidden,
    /// The account lookup failed.
    Unavailable,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Admin access required").into_response(),
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAdminAuth {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminAuthRejection::Unauthorized)?;

        let admin: CurrentAdmin = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten()
            .ok_or(AdminAuthRejection::RedirectToLogin)?;

        let user = UserRepository::new(state.pool())
            .get_by_id(admin.id)
            .await
            .map_err(|e| {
                tracing::error!(admin_id = %admin.id, "Admin lookup failed: {e}");
                AdminAuthRejection::Unavailable
            })?;

        match user {
            Some(user) if user.is_admin => Ok(Self(admin)),
            _ => {
                tracing::warn!(admin_id = %admin.id, "Session no longer belongs to an admin");
                Err(AdminAuthRejection::Forbidden)
            }
        }
    }
}

/// Extractor that optionally gets the session's admin.
///
/// Unlike `RequireAdminAuth`, this neither rejects nor touches the database.
pub struct OptionalAdminAuth(pub Option<CurrentAdmin>);

impl<S> FromRequestParts<S> for OptionalAdminAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(admin))
    }
}

/// Helper to set the current admin in the session.
///
/// The session ID is cycled first so a pre-login session cannot be fixed.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Helper to clear the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
