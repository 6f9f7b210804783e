//! User repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use gamestore_core::{Email, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{User, UserWithHash};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    password_hash: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserWithHash {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&r.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Self {
            user: User {
                id: r.id,
                email,
                is_admin: r.is_admin,
                created_at: r.created_at,
            },
            password_hash: r.password_hash,
        })
    }
}

fn into_user(row: UserRow) -> Result<User, RepositoryError> {
    UserWithHash::try_from(row).map(|u| u.user)
}

const USER_COLUMNS: &str = "id, email, password_hash, is_admin, created_at";

/// Repository for accounts.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Look up an account and its password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_with_hash(&self, email: &Email) -> Result<Option<UserWithHash>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"SELECT {USER_COLUMNS} FROM store."user" WHERE email = $1"#
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;
        row.map(UserWithHash::try_from).transpose()
    }

    /// Get an account by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"SELECT {USER_COLUMNS} FROM store."user" WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        row.map(into_user).transpose()
    }

    /// Get an account by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self.get_with_hash(email).await?.map(|u| u.user))
    }

    /// Every account, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"SELECT {USER_COLUMNS} FROM store."user" ORDER BY created_at DESC, id DESC"#
        ))
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(into_user).collect()
    }

    /// Number of accounts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let n = sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM store."user""#)
            .fetch_one(self.pool)
            .await?;
        Ok(n)
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create(
        &self,
        email: &Email,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO store."user" (email, password_hash, is_admin)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(password_hash)
        .bind(is_admin)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email already exists"))?;
        into_user(row)
    }

    /// Create an admin account or, if the email exists, reset its password
    /// and grant admin.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_admin(&self, email: &Email, password_hash: &str) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO store."user" (email, password_hash, is_admin)
            VALUES ($1, $2, TRUE)
            ON CONFLICT (email) DO UPDATE
                SET password_hash = EXCLUDED.password_hash, is_admin = TRUE
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await?;
        into_user(row)
    }

    /// Grant or revoke admin.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account does not exist.
    pub async fn set_admin(&self, id: UserId, is_admin: bool) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"UPDATE store."user" SET is_admin = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"#
        ))
        .bind(id)
        .bind(is_admin)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;
        into_user(row)
    }
}
