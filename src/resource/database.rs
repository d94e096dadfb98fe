//! SQLite-backed database resource.

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::config::schema::DatabaseConfig;
use crate::error::CoreError;
use crate::resource::Resource;

/// Connection pool acquired by the supervisor at construction.
///
/// Handlers reach it through
/// [`Supervisor::database`](crate::Supervisor::database); the supervisor
/// closes it after every service has stopped and every controller has been
/// destroyed.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the pool. Failures surface as
    /// [`CoreError::ResourceUnavailable`].
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, CoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|source| CoreError::ResourceUnavailable {
                name: "database".to_string(),
                source: Box::new(source),
            })?;

        tracing::info!(url = %config.url, "Database pool opened");

        Ok(Self { pool })
    }

    /// The underlying pool, for queries.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Resource for Database {
    fn name(&self) -> &str {
        "database"
    }

    async fn close(&self) {
        // Pool close is idempotent; repeated calls are no-ops.
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }
}
