//! `PostgreSQL` stores for Estate.
//!
//! [`PostgresStore`] implements every store trait from `estate-core` on one
//! connection pool. Reservation writes run in `SERIALIZABLE` transactions
//! retried on serialization failures, and the schema carries an exclusion
//! constraint so overlapping live stays are rejected even outside the
//! application.
//!
//! # Example
//!
//! ```no_run
//! use estate_postgres::{PoolSettings, PostgresStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PostgresStore::connect("postgres://localhost/estate", &PoolSettings::default()).await?;
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod retry;
mod rows;
mod stores;

pub use retry::{RetryPolicy, is_retryable};

use estate_core::error::StoreError;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

/// SQLSTATE for `exclusion_violation`
const EXCLUSION_VIOLATION: &str = "23P01";
/// SQLSTATE for `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";

/// Connection pool sizing.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections in the pool
    pub min_connections: u32,
    /// Time to wait for a connection
    pub connect_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// `PostgreSQL`-backed implementation of every store trait.
#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
    retry: RetryPolicy,
}

impl PostgresStore {
    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            retry: RetryPolicy::default(),
        }
    }

    /// Connect a new pool.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the database is unreachable.
    pub async fn connect(database_url: &str, settings: &PoolSettings) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.connect_timeout)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to connect: {e}")))?;
        Ok(Self::from_pool(pool))
    }

    /// Replace the retry policy for serializable transactions.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Apply pending migrations from `./migrations`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    /// Round-trip a trivial query; used by the readiness probe.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the database does not answer.
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    /// Underlying pool
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Map a driver error to the store error vocabulary.
fn db_error(err: sqlx::Error) -> StoreError {
    if matches!(err, sqlx::Error::RowNotFound) {
        return StoreError::NotFound;
    }
    match retry::sqlstate(&err).as_deref() {
        Some(EXCLUSION_VIOLATION) => StoreError::Conflict,
        Some(UNIQUE_VIOLATION) => StoreError::Duplicate(err.to_string()),
        _ => StoreError::Database(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert_eq!(db_error(sqlx::Error::RowNotFound), StoreError::NotFound);
        assert!(matches!(
            db_error(sqlx::Error::PoolTimedOut),
            StoreError::Database(_)
        ));
    }
}
