//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::{CoverStore, StorefrontService};

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
    covers: CoverStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let covers = CoverStore::new(config.covers_dir.clone(), config.max_upload_bytes);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                covers,
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

    /// Get a reference to the cover image store.
    #[must_use]
    pub fn covers(&self) -> &CoverStore {
        &self.inner.covers
    }

    /// Storefront service borrowing this state's pool and cover store.
    #[must_use]
    pub fn storefront(&self) -> StorefrontService<'_> {
        StorefrontService::new(&self.inner.pool, &self.inner.covers)
    }
}
