//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. Admin pages get full error details in the
//! response body for client errors; server errors stay generic.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use gamestore_core::catalog::CatalogError;
use gamestore_core::settings::SettingsError;
use gamestore_store::RepositoryError;
use gamestore_store::services::{AuthError, PurchaseError};

/// Application-level error type for admin.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Purchase workflow failed.
    #[error("Purchase error: {0}")]
    Purchase(#[from] PurchaseError),

    /// Catalog input was rejected.
    #[error("Invalid catalog input: {0}")]
    Catalog(#[from] CatalogError),

    /// Settings edit was rejected.
    #[error("Invalid setting: {0}")]
    Settings(#[from] SettingsError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Signed in, but not an admin.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Session(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Purchase(err) => match err {
                PurchaseError::EmptyCart
                | PurchaseError::InsufficientStock { .. }
                | PurchaseError::TotalTooLarge => StatusCode::BAD_REQUEST,
                PurchaseError::NotFound => StatusCode::NOT_FOUND,
                PurchaseError::InvalidTransition { .. } => StatusCode::CONFLICT,
                PurchaseError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Catalog(_) | Self::Settings(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let message = match &self {
            _ if status.is_server_error() => "Internal server error".to_string(),
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Catalog(err) => err.to_string(),
            Self::Settings(err) => err.to_string(),
            Self::Purchase(err) => err.to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the signed-in admin.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamestore_core::PurchaseStatus;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::Forbidden("not an admin".to_string());
        assert_eq!(err.to_string(), "Forbidden: not an admin");

        let err = AppError::Catalog(CatalogError::InvalidSalePercentage(120));
        assert_eq!(
            err.to_string(),
            "Invalid catalog input: sale percentage must be between 1 and 99, got 120"
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict(
                "slug taken".to_string()
            ))),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_domain_errors_are_client_errors() {
        assert_eq!(
            get_status(AppError::Settings(SettingsError::InvalidColor(
                "red".to_string()
            ))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Catalog(CatalogError::Negative("stock"))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Purchase(PurchaseError::InvalidTransition {
                from: PurchaseStatus::Cancelled,
                to: PurchaseStatus::Completed,
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Purchase(PurchaseError::NotFound)),
            StatusCode::NOT_FOUND
        );
    }
}
