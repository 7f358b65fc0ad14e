use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::info;

use crate::filter::FilterError;

/// Errors from the data-access layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    /// Constraint violations become their own kinds so the HTTP layer can
    /// answer 409/400 instead of 500.
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            if db_err.is_unique_violation() {
                return DatabaseError::Conflict(format!("A record with the same value already exists ({})", constraint));
            }
            if db_err.is_foreign_key_violation() {
                return DatabaseError::InvalidReference(format!("Referenced record does not exist ({})", constraint));
            }
        }
        DatabaseError::Sqlx(err)
    }
}

/// Owner of the process-wide connection pool
pub struct DatabaseManager;

static POOL: OnceCell<PgPool> = OnceCell::const_new();

impl DatabaseManager {
    /// Get the shared pool, connecting on first use
    pub async fn pool() -> Result<PgPool, DatabaseError> {
        POOL.get_or_try_init(|| async {
            let url = Self::database_url()?;
            let pool = Self::pool_options().connect(&url).await?;
            info!("Created database pool");
            Ok::<_, DatabaseError>(pool)
        })
        .await
        .cloned()
    }

    /// Pool that defers connecting until the first query
    pub fn lazy_pool(url: &str) -> Result<PgPool, DatabaseError> {
        Ok(Self::pool_options().connect_lazy(url)?)
    }

    fn pool_options() -> PgPoolOptions {
        let db = &crate::config::config().database;
        PgPoolOptions::new()
            .max_connections(db.max_connections)
            .acquire_timeout(Duration::from_secs(db.connection_timeout))
    }

    fn database_url() -> Result<String, DatabaseError> {
        crate::config::config()
            .database
            .url
            .clone()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Close the shared pool (e.g., on shutdown)
    pub async fn close() {
        if let Some(pool) = POOL.get() {
            pool.close().await;
            info!("Closed database pool");
        }
    }
}
