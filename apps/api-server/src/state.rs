//! Application state - shared across all handlers.

use std::sync::Arc;

use scribe_core::BlogService;
use scribe_core::ports::PasswordService;
use scribe_core::services::{BlogSettings, Repositories};
use scribe_infra::InMemoryStore;
use scribe_infra::database::{DatabaseConfig, DatabaseConnections};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub blog: Arc<BlogService>,
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Build the state, backed by PostgreSQL when a database is configured and
    /// reachable, otherwise by the in-memory store.
    pub async fn new(
        db_config: Option<&DatabaseConfig>,
        passwords: Arc<dyn PasswordService>,
        settings: BlogSettings,
    ) -> Self {
        let (db, repos) = Self::storage(db_config).await;
        tracing::info!(
            page_size = settings.page_size,
            persistent = db.is_some(),
            "Application state initialized"
        );

        Self {
            blog: Arc::new(BlogService::new(repos, passwords, settings)),
            db,
        }
    }

    /// State over a fresh in-memory store.
    #[cfg(test)]
    pub fn in_memory(passwords: Arc<dyn PasswordService>, settings: BlogSettings) -> Self {
        Self {
            blog: Arc::new(BlogService::new(
                InMemoryStore::new().repositories(),
                passwords,
                settings,
            )),
            db: None,
        }
    }

    #[cfg(feature = "postgres")]
    async fn storage(
        db_config: Option<&DatabaseConfig>,
    ) -> (Option<Arc<DatabaseConnections>>, Repositories) {
        let Some(config) = db_config else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return (None, InMemoryStore::new().repositories());
        };

        match DatabaseConnections::init(config).await {
            Ok(connections) => {
                let repos = connections.repositories();
                (Some(Arc::new(connections)), repos)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Failed to connect to database. Using in-memory fallback."
                );
                (None, InMemoryStore::new().repositories())
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn storage(
        _db_config: Option<&DatabaseConfig>,
    ) -> (Option<Arc<DatabaseConnections>>, Repositories) {
        tracing::info!("Running without postgres feature - using in-memory store");
        (None, InMemoryStore::new().repositories())
    }
}
