//! Admin notification repository.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use gamestore_core::{NotificationId, NotificationKind};

use super::RepositoryError;
use crate::models::Notification;

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: NotificationId,
    kind: NotificationKind,
    title: String,
    message: String,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(r: NotificationRow) -> Self {
        Self {
            id: r.id,
            kind: r.kind,
            title: r.title,
            message: r.message,
            is_read: r.is_read,
            created_at: r.created_at,
        }
    }
}

/// Repository for admin notifications.
pub struct NotificationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> NotificationRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Notification>, RepositoryError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r"
            SELECT id, kind, title, message, is_read, created_at
            FROM store.notification
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Notification::from).collect())
    }

    /// Unread count for the nav badge.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn unread_count(&self) -> Result<i64, RepositoryError> {
        let n = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM store.notification WHERE NOT is_read",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(n)
    }

    /// Mark one notification read.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if it does not exist.
    pub async fn mark_read(&self, id: NotificationId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE store.notification SET is_read = TRUE WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Mark everything read. Returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_all_read(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("UPDATE store.notification SET is_read = TRUE WHERE NOT is_read")
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Append a notification.
pub(crate) async fn insert_in(
    conn: &mut PgConnection,
    kind: NotificationKind,
    message: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO store.notification (kind, title, message) VALUES ($1, $2, $3)")
        .bind(kind)
        .bind(kind.title())
        .bind(message)
        .execute(conn)
        .await?;
    Ok(())
}
