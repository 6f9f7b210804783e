//! Cart repository.
//!
//! One row per (user, product). Adding an existing product merges into the
//! row; a quantity of zero or less deletes it.

use sqlx::PgPool;

use gamestore_core::catalog::Sale;
use gamestore_core::{CartItemId, Money, ProductId, UserId};

use super::RepositoryError;
use crate::models::CartLine;

#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartItemId,
    product_id: ProductId,
    name: String,
    image_url: Option<String>,
    price: Money,
    sale_active: bool,
    sale_price: Option<Money>,
    quantity: i32,
    stock: i32,
}

impl From<CartRow> for CartLine {
    fn from(r: CartRow) -> Self {
        let sale = Sale {
            active: r.sale_active,
            percentage: 0,
            price: r.sale_price,
        };
        Self {
            id: r.id,
            product_id: r.product_id,
            name: r.name,
            image_url: r.image_url,
            unit_price: sale.effective_price(r.price),
            quantity: r.quantity,
            stock: r.stock,
        }
    }
}

const CART_LINES_FOR_USER: &str = r"
    SELECT ci.id, ci.product_id, p.name, p.image_url, p.price, p.sale_active, p.sale_price,
           ci.quantity, p.stock
    FROM store.cart_item ci
    JOIN store.product p ON p.id = ci.product_id
    WHERE ci.user_id = $1
    ORDER BY ci.created_at, ci.id
";

/// Repository for shopping carts.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's cart, oldest line first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, user: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        Ok(lines_in(&mut conn, user).await?)
    }

    /// Quantity of `product` already in the cart (0 when absent).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn quantity_of(&self, user: UserId, product: ProductId) -> Result<i32, RepositoryError> {
        let qty = sqlx::query_scalar::<_, i32>(
            "SELECT quantity FROM store.cart_item WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user)
        .bind(product)
        .fetch_optional(self.pool)
        .await?;
        Ok(qty.unwrap_or(0))
    }

    /// Add `quantity` of a product, merging into an existing line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn add(
        &self,
        user: UserId,
        product: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO store.cart_item (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = store.cart_item.quantity + EXCLUDED.quantity
            ",
        )
        .bind(user)
        .bind(product)
        .bind(quantity)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;
        Ok(())
    }

    /// Set a line's quantity; zero or less removes it. Scoped to `user` so a
    /// shopper cannot touch another cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line is not in this cart.
    pub async fn set_quantity(
        &self,
        user: UserId,
        item: CartItemId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        if quantity <= 0 {
            return self.remove(user, item).await;
        }
        let result = sqlx::query(
            "UPDATE store.cart_item SET quantity = $3 WHERE id = $1 AND user_id = $2",
        )
        .bind(item)
        .bind(user)
        .bind(quantity)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove one line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line is not in this cart.
    pub async fn remove(&self, user: UserId, item: CartItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store.cart_item WHERE id = $1 AND user_id = $2")
            .bind(item)
            .bind(user)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Empty a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user: UserId) -> Result<(), RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        Ok(clear_in(&mut conn, user).await?)
    }

    /// Sum of quantities, for the header badge.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, user: UserId) -> Result<i64, RepositoryError> {
        let n = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM store.cart_item WHERE user_id = $1",
        )
        .bind(user)
        .fetch_one(self.pool)
        .await?;
        Ok(n)
    }
}

/// Cart lines on an existing connection (e.g. inside a checkout transaction).
pub(crate) async fn lines_in(
    conn: &mut sqlx::PgConnection,
    user: UserId,
) -> Result<Vec<CartLine>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CartRow>(CART_LINES_FOR_USER)
        .bind(user)
        .fetch_all(conn)
        .await?;
    Ok(rows.into_iter().map(CartLine::from).collect())
}

pub(crate) async fn clear_in(conn: &mut sqlx::PgConnection, user: UserId) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM store.cart_item WHERE user_id = $1")
        .bind(user)
        .execute(conn)
        .await?;
    Ok(())
}
