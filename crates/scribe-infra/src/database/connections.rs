#[cfg(feature = "postgres")]
use std::sync::Arc;
#[cfg(feature = "postgres")]
use std::time::Duration;

#[cfg(feature = "postgres")]
use sea_orm::{ConnectOptions, Database, DbConn, DbErr};

#[cfg(feature = "postgres")]
use scribe_core::services::Repositories;

/// Configuration for the main database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub main_url: String,
    pub main_max_connections: u32,
    pub main_min_connections: u32,
    pub secondary_databases: Vec<SecondaryDbConfig>,
}

/// Configuration for a secondary database (reporting replicas and the like).
#[derive(Debug, Clone)]
pub struct SecondaryDbConfig {
    pub name: String,
    pub url: String,
    pub max_connections: u32,
}

/// A named connection to a secondary database.
#[cfg(feature = "postgres")]
pub struct NamedConnection {
    pub name: String,
    pub conn: DbConn,
}

#[cfg(not(feature = "postgres"))]
pub struct NamedConnection {
    pub name: String,
}

/// Connection pools: one main database holding the blog tables, plus any
/// number of named secondaries.
///
/// `main` is shared by every repository.
#[cfg(feature = "postgres")]
pub struct DatabaseConnections {
    pub main: Arc<DbConn>,
    pub secondary: Vec<NamedConnection>,
}

#[cfg(not(feature = "postgres"))]
pub struct DatabaseConnections {
    pub secondary: Vec<NamedConnection>,
}

#[cfg(feature = "postgres")]
fn options(url: &str, max: u32, min: u32) -> ConnectOptions {
    ConnectOptions::new(url)
        .max_connections(max)
        .min_connections(min)
        .connect_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(false)
        .to_owned()
}

#[cfg(feature = "postgres")]
impl DatabaseConnections {
    /// Open every configured pool.
    pub async fn init(config: &DatabaseConfig) -> Result<Self, DbErr> {
        tracing::info!("Initializing database connections...");

        let main = Arc::new(
            Database::connect(options(
                &config.main_url,
                config.main_max_connections,
                config.main_min_connections,
            ))
            .await?,
        );
        tracing::info!(pool = config.main_max_connections, "Main database connected");

        let mut secondary = Vec::with_capacity(config.secondary_databases.len());
        for db_config in &config.secondary_databases {
            let conn = Database::connect(options(&db_config.url, db_config.max_connections, 1)).await?;
            tracing::info!(
                name = %db_config.name,
                pool = db_config.max_connections,
                "Secondary database connected"
            );
            secondary.push(NamedConnection {
                name: db_config.name.clone(),
                conn,
            });
        }

        Ok(Self { main, secondary })
    }

    /// Get a secondary database connection by name.
    pub fn get(&self, name: &str) -> Option<&DbConn> {
        self.secondary
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.conn)
    }

    pub fn secondary_names(&self) -> Vec<&str> {
        self.secondary.iter().map(|c| c.name.as_str()).collect()
    }

    /// Round-trip to the main database; used by the health check.
    pub async fn ping(&self) -> Result<(), DbErr> {
        self.main.ping().await
    }

    /// Every repository port, backed by the main database.
    pub fn repositories(&self) -> Repositories {
        use super::{
            PostgresCategoryRepository, PostgresCommentRepository, PostgresLikeRepository,
            PostgresPostRepository, PostgresTagRepository, PostgresUserRepository,
        };

        Repositories {
            users: Arc::new(PostgresUserRepository::new(Arc::clone(&self.main))),
            posts: Arc::new(PostgresPostRepository::new(Arc::clone(&self.main))),
            categories: Arc::new(PostgresCategoryRepository::new(Arc::clone(&self.main))),
            tags: Arc::new(PostgresTagRepository::new(Arc::clone(&self.main))),
            comments: Arc::new(PostgresCommentRepository::new(Arc::clone(&self.main))),
            likes: Arc::new(PostgresLikeRepository::new(Arc::clone(&self.main))),
        }
    }
}
