//! Database migration command.
//!
//! Migrations live in `migrations/` at the workspace root and are embedded
//! into the binary at build time. They create the `store`, `storefront` and
//! `admin` schemas; the two session tables live in the latter two.

use thiserror::Error;

use super::{DATABASE_URL_VAR, connect, database_url};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply pending migrations.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is unset, the database is unreachable
/// or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let url = database_url().ok_or(MigrationError::MissingEnvVar(DATABASE_URL_VAR))?;
    let pool = connect(&url).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../../migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
