//! Database connection management
//!
//! Provides the shared SQLite pool (bounded min 1 / max 10), migrations
//! and health checks.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::error::Result;

/// Type alias for the database connection pool
pub type DatabasePool = SqlitePool;

/// Database connection wrapper
#[derive(Clone, Debug)]
pub struct Database {
    pool: DatabasePool,
}

impl Database {
    /// Connect with the default pool bounds (min 1, max 10)
    ///
    /// # Arguments
    /// * `database_url` - SQLite connection string (e.g. "sqlite:movi.db"
    ///   or "sqlite::memory:")
    pub async fn new(database_url: &str) -> Result<Self> {
        Self::with_max_connections(database_url, 10).await
    }

    /// Connect with a custom maximum pool size
    pub async fn with_max_connections(database_url: &str, max_connections: u32) -> Result<Self> {
        debug!(url = %database_url, "Connecting to database");

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        info!(url = %database_url, "Database connection established");
        Ok(Self { pool })
    }

    /// Get a clone of the connection pool
    pub fn pool(&self) -> DatabasePool {
        self.pool.clone()
    }

    /// Run the embedded migrations
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| crate::error::AgentError::Database(sqlx::Error::Migrate(Box::new(e))))?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Perform a health check by running a simple query
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
