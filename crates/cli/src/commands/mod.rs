//! Subcommand implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;

/// Environment variable every command connects with.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Read `DATABASE_URL`, loading `.env` first.
pub fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();
    std::env::var(DATABASE_URL_VAR).ok().map(SecretString::from)
}

/// Connect with the shared pool settings.
pub async fn connect(url: &SecretString) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Connecting to database...");
    gamestore_store::create_pool(url).await
}
