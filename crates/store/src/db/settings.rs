//! Admin settings repository.
//!
//! A plain `key -> text` table. Typed access goes through
//! [`gamestore_core::settings::StoreSettings`].

use std::collections::HashMap;

use sqlx::PgPool;

use gamestore_core::settings::StoreSettings;

use super::RepositoryError;

/// Repository for the settings table.
pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every setting as a map.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn all(&self) -> Result<HashMap<String, String>, RepositoryError> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT setting_key, setting_value FROM store.admin_setting",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }

    /// The typed view with defaults applied.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn load(&self) -> Result<StoreSettings, RepositoryError> {
        Ok(StoreSettings::from_map(&self.all().await?))
    }

    /// One raw value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let value = sqlx::query_scalar::<_, String>(
            "SELECT setting_value FROM store.admin_setting WHERE setting_key = $1",
        )
        .bind(key)
        .fetch_optional(self.pool)
        .await?;
        Ok(value)
    }

    /// Insert or replace one value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO store.admin_setting (setting_key, setting_value)
            VALUES ($1, $2)
            ON CONFLICT (setting_key)
            DO UPDATE SET setting_value = EXCLUDED.setting_value, updated_at = NOW()
            ",
        )
        .bind(key)
        .bind(value)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Write several values atomically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any write fails; nothing is
    /// written in that case.
    pub async fn set_many(&self, pairs: &[(&str, &str)]) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        for (key, value) in pairs {
            sqlx::query(
                r"
                INSERT INTO store.admin_setting (setting_key, setting_value)
                VALUES ($1, $2)
                ON CONFLICT (setting_key)
                DO UPDATE SET setting_value = EXCLUDED.setting_value, updated_at = NOW()
                ",
            )
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
