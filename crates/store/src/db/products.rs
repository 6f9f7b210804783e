//! Product repository.
//!
//! Stock is only ever changed with single-statement relative updates
//! (`stock = stock - $n`), never by writing back a value read earlier.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use gamestore_core::catalog::{ProductSort, Sale, SalePercentage};
use gamestore_core::{CategoryId, Money, ProductId, SubcategoryId};

use super::RepositoryError;
use crate::models::{NewProduct, Product, ProductListing, ProductUpdate};

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    subcategory_id: SubcategoryId,
    name: String,
    description: String,
    price: Money,
    image_url: Option<String>,
    stock: i32,
    specifications: serde_json::Value,
    sale_active: bool,
    sale_percentage: i32,
    sale_price: Option<Money>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(r: ProductRow) -> Result<Self, Self::Error> {
        if !r.specifications.is_object() {
            return Err(RepositoryError::DataCorruption(format!(
                "product {} specifications are not an object",
                r.id
            )));
        }
        Ok(Self {
            id: r.id,
            subcategory_id: r.subcategory_id,
            name: r.name,
            description: r.description,
            price: r.price,
            image_url: r.image_url,
            stock: r.stock,
            specifications: r.specifications,
            sale: Sale {
                active: r.sale_active,
                percentage: r.sale_percentage,
                price: r.sale_price,
            },
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ListingRow {
    #[sqlx(flatten)]
    product: ProductRow,
    subcategory_name: String,
    category_name: String,
    category_slug: String,
}

impl TryFrom<ListingRow> for ProductListing {
    type Error = RepositoryError;

    fn try_from(r: ListingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            product: r.product.try_into()?,
            subcategory_name: r.subcategory_name,
            category_name: r.category_name,
            category_slug: r.category_slug,
        })
    }
}

const PRODUCT_COLUMNS: &str = r"
    p.id, p.subcategory_id, p.name, p.description, p.price, p.image_url, p.stock,
    p.specifications, p.sale_active, p.sale_percentage, p.sale_price,
    p.created_at, p.updated_at
";

fn listing_select() -> String {
    format!(
        r"
        SELECT {PRODUCT_COLUMNS},
               s.name AS subcategory_name, c.name AS category_name, c.slug AS category_slug
        FROM store.product p
        JOIN store.subcategory s ON s.id = p.subcategory_id
        JOIN store.category c ON c.id = s.category_id
        "
    )
}

fn collect_listings(rows: Vec<ListingRow>) -> Result<Vec<ProductListing>, RepositoryError> {
    rows.into_iter().map(ProductListing::try_from).collect()
}

/// Escape `%`, `_` and `\` so a search term matches literally in `ILIKE`.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Repository for products.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Storefront catalog, newest first, optionally filtered by a name search.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_newest(&self, search: Option<&str>) -> Result<Vec<ProductListing>, RepositoryError> {
        let rows = sqlx::query_as::<_, ListingRow>(&format!(
            "{} WHERE ($1::text IS NULL OR p.name ILIKE $1) ORDER BY p.created_at DESC, p.id DESC",
            listing_select()
        ))
        .bind(search.map(like_pattern))
        .fetch_all(self.pool)
        .await?;
        collect_listings(rows)
    }

    /// Products in one category, by subcategory then name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_in_category(
        &self,
        category: CategoryId,
    ) -> Result<Vec<ProductListing>, RepositoryError> {
        let rows = sqlx::query_as::<_, ListingRow>(&format!(
            "{} WHERE c.id = $1 ORDER BY s.name, p.name",
            listing_select()
        ))
        .bind(category)
        .fetch_all(self.pool)
        .await?;
        collect_listings(rows)
    }

    /// Admin product table: optional case-insensitive name search and a sort.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(
        &self,
        search: Option<&str>,
        sort: ProductSort,
    ) -> Result<Vec<ProductListing>, RepositoryError> {
        let rows = sqlx::query_as::<_, ListingRow>(&format!(
            "{} WHERE ($1::text IS NULL OR p.name ILIKE $1) ORDER BY {}",
            listing_select(),
            sort.order_by()
        ))
        .bind(search.map(like_pattern))
        .fetch_all(self.pool)
        .await?;
        collect_listings(rows)
    }

    /// One product with its category names.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<ProductListing>, RepositoryError> {
        let row = sqlx::query_as::<_, ListingRow>(&format!("{} WHERE p.id = $1", listing_select()))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        row.map(ProductListing::try_from).transpose()
    }

    /// Total product count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM store.product")
            .fetch_one(self.pool)
            .await?;
        Ok(n)
    }

    /// Products at or below `threshold` stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_low_stock(&self, threshold: i32) -> Result<i64, RepositoryError> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM store.product WHERE stock <= $1")
            .bind(threshold)
            .fetch_one(self.pool)
            .await?;
        Ok(n)
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the subcategory does not exist.
    pub async fn create(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO store.product AS p
                (subcategory_id, name, description, price, image_url, stock, specifications)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(new.subcategory_id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price)
        .bind(new.image_url.as_deref())
        .bind(new.stock)
        .bind(sqlx::types::Json(&new.specifications))
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;
        row.try_into()
    }

    /// Update the editable fields. An active sale keeps its percentage and is
    /// re-priced from the new list price.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn update(&self, id: ProductId, update: &ProductUpdate) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM store.product p WHERE p.id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;
        let sale = Product::try_from(current)?.sale.repriced(update.price);

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE store.product AS p
            SET name = $2, description = $3, price = $4, image_url = $5, stock = $6,
                specifications = $7, sale_price = $8, updated_at = NOW()
            WHERE p.id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.description)
        .bind(update.price)
        .bind(update.image_url.as_deref())
        .bind(update.stock)
        .bind(sqlx::types::Json(&update.specifications))
        .bind(sale.price)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    /// Put a product on sale.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn start_sale(&self, id: ProductId, pct: SalePercentage) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let price = sqlx::query_scalar::<_, Money>(
            "SELECT price FROM store.product WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;
        let sale = Sale::started(price, pct);

        let row = write_sale(&mut tx, id, sale).await?;
        tx.commit().await?;
        row.try_into()
    }

    /// End a sale: percentage 0, inactive, no sale price.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn end_sale(&self, id: ProductId) -> Result<Product, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let row = write_sale(&mut conn, id, Sale::default()).await?;
        row.try_into()
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no row was deleted.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

async fn write_sale(
    conn: &mut PgConnection,
    id: ProductId,
    sale: Sale,
) -> Result<ProductRow, RepositoryError> {
    sqlx::query_as::<_, ProductRow>(&format!(
        r"
        UPDATE store.product AS p
        SET sale_active = $2, sale_percentage = $3, sale_price = $4, updated_at = NOW()
        WHERE p.id = $1
        RETURNING {PRODUCT_COLUMNS}
        "
    ))
    .bind(id)
    .bind(sale.active)
    .bind(sale.percentage)
    .bind(sale.price)
    .fetch_optional(conn)
    .await?
    .ok_or(RepositoryError::NotFound)
}

/// Take `qty` units of stock. Returns `false`, changing nothing, when the
/// product is missing or has fewer than `qty` left.
pub(crate) async fn take_stock(
    conn: &mut PgConnection,
    id: ProductId,
    qty: i32,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r"
        UPDATE store.product
        SET stock = stock - $2, updated_at = NOW()
        WHERE id = $1 AND stock >= $2
        ",
    )
    .bind(id)
    .bind(qty)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Hand `qty` units back. A product deleted since the purchase is skipped.
pub(crate) async fn return_stock(
    conn: &mut PgConnection,
    id: ProductId,
    qty: i32,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r"
        UPDATE store.product
        SET stock = stock + $2, updated_at = NOW()
        WHERE id = $1
        ",
    )
    .bind(id)
    .bind(qty)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("skin"), "%skin%");
        assert_eq!(like_pattern("100%_off"), "%100\\%\\_off%");
    }
}
