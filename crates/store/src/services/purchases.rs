//! Purchase request workflow.
//!
//! ```text
//!   cart ──checkout──► pending ──complete──► completed
//!                         │
//!                         └────cancel─────► cancelled (stock returned)
//! ```
//!
//! Each operation runs in a single transaction. Checkout takes stock with
//! conditional relative updates, so two shoppers racing for the last unit
//! cannot both get it. Complete and cancel claim the `pending` row with a
//! conditional update before doing anything else, so a second attempt finds
//! nothing to claim and stock is never returned twice.

use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument, warn};

use gamestore_core::purchase::{
    LineItem, PurchaseNumber, Snapshot, cancelled_message, completed_message, new_purchase_message,
};
use gamestore_core::{Money, NotificationKind, PurchaseId, PurchaseStatus, UserId};

use crate::db::{RepositoryError, cart, notifications, products, purchases};
use crate::models::{CartLine, PurchaseRequest};

/// Errors from the purchase workflow.
#[derive(Debug, Error)]
pub enum PurchaseError {
    /// Checkout with nothing in the cart.
    #[error("your cart is empty")]
    EmptyCart,

    /// A product no longer has enough stock; nothing was written.
    #[error("not enough stock for {name}: {available} left")]
    InsufficientStock { name: String, available: i32 },

    /// The cart total does not fit a single purchase request.
    #[error("your order total is over {}, the most one purchase request can hold", Money::MAX_TOTAL)]
    TotalTooLarge,

    /// No such purchase.
    #[error("purchase request not found")]
    NotFound,

    /// The purchase is not pending any more.
    #[error("purchase request is already {from}, cannot mark it {to}")]
    InvalidTransition {
        from: PurchaseStatus,
        to: PurchaseStatus,
    },

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for PurchaseError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Purchase workflow service.
pub struct PurchaseService<'a> {
    pool: &'a PgPool,
}

impl<'a> PurchaseService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turn a user's cart into a pending purchase request.
    ///
    /// In one transaction: snapshot the cart at current effective prices,
    /// insert the order, take stock for every line, notify admins and empty
    /// the cart. Any failure rolls everything back.
    ///
    /// # Errors
    ///
    /// Returns `PurchaseError::EmptyCart` for an empty cart,
    /// `PurchaseError::TotalTooLarge` when the total exceeds
    /// [`Money::MAX_TOTAL`] and `PurchaseError::InsufficientStock` when a
    /// line can no longer be filled.
    #[instrument(skip(self, currency_symbol), fields(user_id = %user))]
    pub async fn create_from_cart(
        &self,
        user: UserId,
        currency_symbol: &str,
    ) -> Result<PurchaseRequest, PurchaseError> {
        let mut tx = self.pool.begin().await?;

        let lines = cart::lines_in(&mut tx, user).await?;
        let items = lines
            .iter()
            .map(line_item)
            .collect::<Result<Vec<_>, RepositoryError>>()?;
        let snapshot = Snapshot::from_items(items).ok_or(PurchaseError::EmptyCart)?;
        if snapshot.total > Money::MAX_TOTAL {
            return Err(PurchaseError::TotalTooLarge);
        }

        let number = PurchaseNumber::generate(Utc::now());
        let purchase = purchases::insert_in(&mut tx, &number, user, &snapshot).await?;

        for (product_id, qty) in snapshot.stock_deltas() {
            if !products::take_stock(&mut tx, product_id, qty).await? {
                let line = lines.iter().find(|l| l.product_id == product_id);
                return Err(PurchaseError::InsufficientStock {
                    name: line.map_or_else(|| product_id.to_string(), |l| l.name.clone()),
                    available: line.map_or(0, |l| l.stock),
                });
            }
        }

        notifications::insert_in(
            &mut tx,
            NotificationKind::NewPurchase,
            &new_purchase_message(&number, snapshot.total, currency_symbol, user),
        )
        .await?;

        cart::clear_in(&mut tx, user).await?;

        tx.commit().await?;

        info!(
            purchase_number = %purchase.number,
            total = %purchase.total,
            lines = purchase.items.len(),
            "Purchase request created"
        );
        Ok(purchase)
    }

    /// Mark a pending purchase completed. Stock was already taken at checkout.
    ///
    /// # Errors
    ///
    /// Returns `PurchaseError::NotFound` or `PurchaseError::InvalidTransition`.
    #[instrument(skip(self))]
    pub async fn complete(&self, id: PurchaseId) -> Result<PurchaseRequest, PurchaseError> {
        let mut tx = self.pool.begin().await?;

        let purchase = claim(&mut tx, id, PurchaseStatus::Completed).await?;

        notifications::insert_in(
            &mut tx,
            NotificationKind::PurchaseCompleted,
            &completed_message(id),
        )
        .await?;

        tx.commit().await?;
        info!(purchase_number = %purchase.number, "Purchase request completed");
        Ok(purchase)
    }

    /// Cancel a pending purchase and return its snapshot quantities to stock.
    ///
    /// # Errors
    ///
    /// Returns `PurchaseError::NotFound` or `PurchaseError::InvalidTransition`.
    #[instrument(skip(self))]
    pub async fn cancel(&self, id: PurchaseId) -> Result<PurchaseRequest, PurchaseError> {
        let mut tx = self.pool.begin().await?;

        let purchase = claim(&mut tx, id, PurchaseStatus::Cancelled).await?;

        let snapshot = Snapshot {
            items: purchase.items.clone(),
            total: purchase.total,
        };
        for (product_id, qty) in snapshot.stock_deltas() {
            if !products::return_stock(&mut tx, product_id, qty).await? {
                warn!(%product_id, qty, "Product deleted since purchase, stock not returned");
            }
        }

        notifications::insert_in(
            &mut tx,
            NotificationKind::PurchaseCancelled,
            &cancelled_message(id),
        )
        .await?;

        tx.commit().await?;
        info!(purchase_number = %purchase.number, "Purchase request cancelled");
        Ok(purchase)
    }
}

/// Claim a pending purchase for `next`, explaining why when it cannot be.
async fn claim(
    conn: &mut sqlx::PgConnection,
    id: PurchaseId,
    next: PurchaseStatus,
) -> Result<PurchaseRequest, PurchaseError> {
    if !PurchaseStatus::Pending.can_transition_to(next) {
        return Err(PurchaseError::InvalidTransition {
            from: PurchaseStatus::Pending,
            to: next,
        });
    }
    if let Some(purchase) = purchases::claim_transition_in(conn, id, next).await? {
        return Ok(purchase);
    }
    match purchases::status_in(conn, id).await? {
        None => Err(PurchaseError::NotFound),
        Some(from) => Err(PurchaseError::InvalidTransition { from, to: next }),
    }
}

/// Snapshot line for a cart row. The column is checked positive, so a row
/// that is not is reported rather than silently dropped.
fn line_item(line: &CartLine) -> Result<LineItem, RepositoryError> {
    let quantity = u32::try_from(line.quantity).map_err(|_| {
        RepositoryError::DataCorruption(format!(
            "cart item {} has quantity {}",
            line.id, line.quantity
        ))
    })?;
    Ok(LineItem::new(
        line.product_id,
        line.name.clone(),
        line.unit_price,
        quantity,
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gamestore_core::{CartItemId, ProductId};

    use super::*;

    fn cart_line(quantity: i32) -> CartLine {
        CartLine {
            id: CartItemId::new(12),
            product_id: ProductId::new(4),
            name: "Dragon Skin".to_owned(),
            image_url: None,
            unit_price: "2.50".parse().unwrap(),
            quantity,
            stock: 9,
        }
    }

    #[test]
    fn test_line_item_from_cart_row() {
        let item = line_item(&cart_line(3)).unwrap();
        assert_eq!(item.quantity, 3);
        assert_eq!(item.total.to_string(), "7.50");

        match line_item(&cart_line(-2)).unwrap_err() {
            RepositoryError::DataCorruption(msg) => {
                assert_eq!(msg, "cart item 12 has quantity -2");
            }
            other => panic!("expected DataCorruption, got {other:?}"),
        }
    }

    #[test]
    fn test_error_messages() {
        let e = PurchaseError::InvalidTransition {
            from: PurchaseStatus::Completed,
            to: PurchaseStatus::Cancelled,
        };
        assert_eq!(
            e.to_string(),
            "purchase request is already completed, cannot mark it cancelled"
        );
        let e = PurchaseError::InsufficientStock {
            name: "Dragon Skin".to_owned(),
            available: 1,
        };
        assert_eq!(e.to_string(), "not enough stock for Dragon Skin: 1 left");
        assert_eq!(
            PurchaseError::TotalTooLarge.to_string(),
            "your order total is over 999999999999.99, the most one purchase request can hold"
        );
    }
}
