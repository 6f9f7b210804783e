//! Admin account management commands.
//!
//! The admin console has no sign-up; the first admin is created here and
//! can then promote other accounts from the Users page.

use thiserror::Error;

use gamestore_store::services::{AuthError, AuthService};

use super::{DATABASE_URL_VAR, connect, database_url};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Account lookup or update failed.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Create an admin account, or promote an existing one and reset its
/// password.
///
/// # Errors
///
/// Returns an error for an invalid email, a weak password or a database
/// failure.
pub async fn create(email: &str, password: &str) -> Result<(), AdminError> {
    let url = database_url().ok_or(AdminError::MissingEnvVar(DATABASE_URL_VAR))?;
    let pool = connect(&url).await?;

    let user = AuthService::new(&pool).ensure_admin(email, password).await?;
    tracing::info!(user_id = %user.id, email = %user.email, "Admin account ready");
    Ok(())
}

/// Grant or revoke admin on an existing account.
///
/// # Errors
///
/// Returns `AuthError::UserNotFound` if no account has this email.
pub async fn set_admin(email: &str, is_admin: bool) -> Result<(), AdminError> {
    let url = database_url().ok_or(AdminError::MissingEnvVar(DATABASE_URL_VAR))?;
    let pool = connect(&url).await?;

    let user = AuthService::new(&pool)
        .set_admin_by_email(email, is_admin)
        .await?;
    if is_admin {
        tracing::info!(user_id = %user.id, email = %user.email, "Admin granted");
    } else {
        tracing::info!(user_id = %user.id, email = %user.email, "Admin revoked");
    }
    Ok(())
}
