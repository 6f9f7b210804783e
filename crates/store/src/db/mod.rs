//! Database operations for the GameStore `PostgreSQL` database.
//!
//! ## Tables (schema `store`)
//!
//! - `category`, `subcategory`, `product` - The catalog
//! - `"user"` - Accounts (shoppers and admins, `is_admin` flag)
//! - `cart_item` - One row per (user, product)
//! - `purchase_request` - Checkout snapshots and their status
//! - `notification` - Admin-facing event log
//! - `admin_setting` - Key-value store configuration
//! - `uploaded_image` - Admin image library (data URLs)
//!
//! Sessions live in `storefront.session` and `admin.session`.
//!
//! # Migrations
//!
//! Migrations are stored in `migrations/` at the workspace root and run via:
//! ```bash
//! cargo run -p gamestore-cli -- migrate
//! ```

pub mod cart;
pub mod categories;
pub mod images;
pub mod notifications;
pub mod products;
pub mod purchases;
pub mod settings;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use cart::CartRepository;
pub use categories::CategoryRepository;
pub use images::ImageRepository;
pub use notifications::NotificationRepository;
pub use products::ProductRepository;
pub use purchases::PurchaseRepository;
pub use settings::SettingsRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique-violation to [`RepositoryError::Conflict`] with `message`,
/// anything else to [`RepositoryError::Database`].
pub(crate) fn conflict_on_unique(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
