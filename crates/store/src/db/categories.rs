//! Category and subcategory repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use gamestore_core::{CategoryId, SubcategoryId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{Category, Subcategory};

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    slug: String,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(r: CategoryRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            slug: r.slug,
            created_at: r.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SubcategoryRow {
    id: SubcategoryId,
    category_id: CategoryId,
    category_name: String,
    name: String,
    slug: String,
    created_at: DateTime<Utc>,
}

impl From<SubcategoryRow> for Subcategory {
    fn from(r: SubcategoryRow) -> Self {
        Self {
            id: r.id,
            category_id: r.category_id,
            category_name: r.category_name,
            name: r.name,
            slug: r.slug,
            created_at: r.created_at,
        }
    }
}

const SUBCATEGORY_SELECT: &str = r"
    SELECT s.id, s.category_id, c.name AS category_name, s.name, s.slug, s.created_at
    FROM store.subcategory s
    JOIN store.category c ON c.id = s.category_id
";

/// Repository for the category tree.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, created_at FROM store.category ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Look up a category by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, created_at FROM store.category WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Category::from))
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, name: &str, slug: &str) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO store.category (name, slug)
            VALUES ($1, $2)
            RETURNING id, name, slug, created_at
            ",
        )
        .bind(name)
        .bind(slug)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "a category with this slug already exists"))?;
        Ok(row.into())
    }

    /// Delete a category with its subcategories and products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no row was deleted.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store.category WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Every subcategory, ordered by category then name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_subcategories(&self) -> Result<Vec<Subcategory>, RepositoryError> {
        let rows = sqlx::query_as::<_, SubcategoryRow>(&format!(
            "{SUBCATEGORY_SELECT} ORDER BY c.name, s.name"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Subcategory::from).collect())
    }

    /// Subcategories of one category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn subcategories_of(
        &self,
        category: CategoryId,
    ) -> Result<Vec<Subcategory>, RepositoryError> {
        let rows = sqlx::query_as::<_, SubcategoryRow>(&format!(
            "{SUBCATEGORY_SELECT} WHERE s.category_id = $1 ORDER BY s.name"
        ))
        .bind(category)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Subcategory::from).collect())
    }

    /// Create a subcategory under `category`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken within the
    /// category and `RepositoryError::NotFound` if the category is missing.
    pub async fn create_subcategory(
        &self,
        category: CategoryId,
        name: &str,
        slug: &str,
    ) -> Result<Subcategory, RepositoryError> {
        let id = sqlx::query_scalar::<_, SubcategoryId>(
            r"
            INSERT INTO store.subcategory (category_id, name, slug)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(category)
        .bind(name)
        .bind(slug)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            conflict_on_unique(e, "this category already has a subcategory with that slug")
        })?;

        let row = sqlx::query_as::<_, SubcategoryRow>(&format!("{SUBCATEGORY_SELECT} WHERE s.id = $1"))
            .bind(id)
            .fetch_one(self.pool)
            .await?;
        Ok(row.into())
    }

    /// Delete a subcategory and its products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no row was deleted.
    pub async fn delete_subcategory(&self, id: SubcategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store.subcategory WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
