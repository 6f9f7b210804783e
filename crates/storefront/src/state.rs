//! Application state shared across handlers.

use std::sync::Arc;

use moka::future::Cache;
use sqlx::PgPool;

use gamestore_core::settings::StoreSettings;
use gamestore_store::RepositoryError;
use gamestore_store::db::SettingsRepository;

use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    settings: Cache<(), Arc<StoreSettings>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let settings = Cache::builder()
            .max_capacity(1)
            .time_to_live(config.settings_cache_ttl)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                settings,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Store settings, read through a short-lived cache.
    ///
    /// Admin edits happen in another process, so they show up here once the
    /// cached entry expires.
    ///
    /// # Errors
    ///
    /// Returns the shared `RepositoryError` if the settings table cannot be
    /// read. Concurrent callers waiting on the same load see the same error.
    pub async fn settings(&self) -> Result<Arc<StoreSettings>, Arc<RepositoryError>> {
        let pool = self.pool().clone();
        self.inner
            .settings
            .try_get_with((), async move {
                SettingsRepository::new(&pool).load().await.map(Arc::new)
            })
            .await
    }

    /// Seed the settings cache, skipping the database on the next read.
    pub async fn prime_settings(&self, settings: StoreSettings) {
        self.inner.settings.insert((), Arc::new(settings)).await;
    }
}
