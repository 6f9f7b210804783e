//! Uploaded image repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use gamestore_core::{ImageId, UserId};

use super::RepositoryError;
use crate::models::{NewImage, UploadedImage};

#[derive(sqlx::FromRow)]
struct ImageRow {
    id: ImageId,
    name: String,
    original_name: String,
    data_url: String,
    original_width: Option<i32>,
    original_height: Option<i32>,
    resized_width: Option<i32>,
    resized_height: Option<i32>,
    file_size: i32,
    mime_type: String,
    created_by: Option<UserId>,
    created_at: DateTime<Utc>,
}

impl From<ImageRow> for UploadedImage {
    fn from(r: ImageRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            original_name: r.original_name,
            data_url: r.data_url,
            original_width: r.original_width,
            original_height: r.original_height,
            resized_width: r.resized_width,
            resized_height: r.resized_height,
            file_size: r.file_size,
            mime_type: r.mime_type,
            created_by: r.created_by,
            created_at: r.created_at,
        }
    }
}

const IMAGE_COLUMNS: &str = r"
    id, name, original_name, data_url, original_width, original_height,
    resized_width, resized_height, file_size, mime_type, created_by, created_at
";

/// Repository for the image library.
pub struct ImageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ImageRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<UploadedImage>, RepositoryError> {
        let rows = sqlx::query_as::<_, ImageRow>(&format!(
            "SELECT {IMAGE_COLUMNS} FROM store.uploaded_image ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(UploadedImage::from).collect())
    }

    /// Store an upload.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, image: &NewImage) -> Result<UploadedImage, RepositoryError> {
        let row = sqlx::query_as::<_, ImageRow>(&format!(
            r"
            INSERT INTO store.uploaded_image
                (name, original_name, data_url, original_width, original_height,
                 resized_width, resized_height, file_size, mime_type, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {IMAGE_COLUMNS}
            "
        ))
        .bind(&image.name)
        .bind(&image.original_name)
        .bind(&image.data_url)
        .bind(image.original_width)
        .bind(image.original_height)
        .bind(image.resized_width)
        .bind(image.resized_height)
        .bind(image.file_size)
        .bind(&image.mime_type)
        .bind(image.created_by)
        .fetch_one(self.pool)
        .await?;
        Ok(row.into())
    }

    /// Delete an image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no row was deleted.
    pub async fn delete(&self, id: ImageId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store.uploaded_image WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
