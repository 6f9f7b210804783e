//! Purchase request repository.
//!
//! Writes that are part of the checkout/cancel workflow take a connection so
//! the service can run them inside its transaction; see
//! [`crate::services::purchases`].

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use gamestore_core::purchase::{LineItem, PurchaseNumber, Snapshot};
use gamestore_core::{Money, PurchaseId, PurchaseStatus, UserId};

use super::RepositoryError;
use crate::models::{PurchaseRequest, PurchaseSummary};

#[derive(sqlx::FromRow)]
struct PurchaseRow {
    id: PurchaseId,
    purchase_number: String,
    user_id: Option<UserId>,
    items: Json<Vec<LineItem>>,
    total_price: Money,
    status: PurchaseStatus,
    chat_notified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PurchaseRow> for PurchaseRequest {
    type Error = RepositoryError;

    fn try_from(r: PurchaseRow) -> Result<Self, Self::Error> {
        let number = PurchaseNumber::parse(&r.purchase_number).ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "invalid purchase number in database: {}",
                r.purchase_number
            ))
        })?;
        Ok(Self {
            id: r.id,
            number,
            user_id: r.user_id,
            items: r.items.0,
            total: r.total_price,
            status: r.status,
            chat_notified: r.chat_notified,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    #[sqlx(flatten)]
    purchase: PurchaseRow,
    buyer_email: Option<String>,
}

const PURCHASE_COLUMNS: &str = r"
    pr.id, pr.purchase_number, pr.user_id, pr.items, pr.total_price, pr.status,
    pr.chat_notified, pr.created_at, pr.updated_at
";

/// Repository for purchase requests.
pub struct PurchaseRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PurchaseRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every purchase with the buyer's email, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<PurchaseSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, SummaryRow>(&format!(
            r#"
            SELECT {PURCHASE_COLUMNS}, u.email AS buyer_email
            FROM store.purchase_request pr
            LEFT JOIN store."user" u ON u.id = pr.user_id
            ORDER BY pr.created_at DESC, pr.id DESC
            "#
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(PurchaseSummary {
                    purchase: r.purchase.try_into()?,
                    buyer_email: r.buyer_email.unwrap_or_else(|| "Unknown User".to_owned()),
                })
            })
            .collect()
    }

    /// A user's purchases, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user: UserId) -> Result<Vec<PurchaseRequest>, RepositoryError> {
        let rows = sqlx::query_as::<_, PurchaseRow>(&format!(
            r"
            SELECT {PURCHASE_COLUMNS}
            FROM store.purchase_request pr
            WHERE pr.user_id = $1
            ORDER BY pr.created_at DESC, pr.id DESC
            "
        ))
        .bind(user)
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(PurchaseRequest::try_from).collect()
    }

    /// Get a purchase by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: PurchaseId) -> Result<Option<PurchaseRequest>, RepositoryError> {
        let row = sqlx::query_as::<_, PurchaseRow>(&format!(
            "SELECT {PURCHASE_COLUMNS} FROM store.purchase_request pr WHERE pr.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        row.map(PurchaseRequest::try_from).transpose()
    }

    /// Get one of `user`'s purchases by its number. Other users' purchases
    /// are reported as missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        number: &PurchaseNumber,
        user: UserId,
    ) -> Result<Option<PurchaseRequest>, RepositoryError> {
        let row = sqlx::query_as::<_, PurchaseRow>(&format!(
            r"
            SELECT {PURCHASE_COLUMNS}
            FROM store.purchase_request pr
            WHERE pr.purchase_number = $1 AND pr.user_id = $2
            "
        ))
        .bind(number.as_str())
        .bind(user)
        .fetch_optional(self.pool)
        .await?;
        row.map(PurchaseRequest::try_from).transpose()
    }

    /// Number of purchases in `status`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_with_status(&self, status: PurchaseStatus) -> Result<i64, RepositoryError> {
        let n = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM store.purchase_request WHERE status = $1",
        )
        .bind(status)
        .fetch_one(self.pool)
        .await?;
        Ok(n)
    }

    /// Record that the buyer has been contacted on the chat platform.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the purchase does not exist.
    pub async fn mark_chat_notified(&self, id: PurchaseId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE store.purchase_request SET chat_notified = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Insert a pending purchase.
pub(crate) async fn insert_in(
    conn: &mut PgConnection,
    number: &PurchaseNumber,
    user: UserId,
    snapshot: &Snapshot,
) -> Result<PurchaseRequest, RepositoryError> {
    let row = sqlx::query_as::<_, PurchaseRow>(&format!(
        r"
        INSERT INTO store.purchase_request AS pr (purchase_number, user_id, items, total_price)
        VALUES ($1, $2, $3, $4)
        RETURNING {PURCHASE_COLUMNS}
        "
    ))
    .bind(number.as_str())
    .bind(user)
    .bind(Json(&snapshot.items))
    .bind(snapshot.total)
    .fetch_one(conn)
    .await?;
    row.try_into()
}

/// Move a pending purchase to `next`. Returns `None` when the purchase does
/// not exist or is no longer pending, in which case nothing changed.
pub(crate) async fn claim_transition_in(
    conn: &mut PgConnection,
    id: PurchaseId,
    next: PurchaseStatus,
) -> Result<Option<PurchaseRequest>, RepositoryError> {
    let row = sqlx::query_as::<_, PurchaseRow>(&format!(
        r"
        UPDATE store.purchase_request AS pr
        SET status = $2, updated_at = NOW()
        WHERE pr.id = $1 AND pr.status = 'pending'
        RETURNING {PURCHASE_COLUMNS}
        "
    ))
    .bind(id)
    .bind(next)
    .fetch_optional(conn)
    .await?;
    row.map(PurchaseRequest::try_from).transpose()
}

/// Current status of a purchase, if it exists.
pub(crate) async fn status_in(
    conn: &mut PgConnection,
    id: PurchaseId,
) -> Result<Option<PurchaseStatus>, sqlx::Error> {
    sqlx::query_scalar::<_, PurchaseStatus>(
        "SELECT status FROM store.purchase_request WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}
