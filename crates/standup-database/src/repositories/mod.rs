//! PostgreSQL implementations of the store traits.

pub mod session;
pub mod token;
pub mod user;

use std::future::Future;
use std::time::Duration;

use sqlx::PgPool;
use tracing::warn;

use standup_core::error::AppError;
use standup_core::result::AppResult;

/// Store backed by a PostgreSQL pool.
///
/// Every operation runs under the configured statement deadline; driver
/// failures and timeouts surface as `StoreUnavailable`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgStore {
    /// Create a new store over an existing pool.
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Run a store operation under the statement deadline.
    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>> + Send,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Store operation timed out"
                );
                Err(AppError::store_unavailable(format!(
                    "Timed out trying to {operation}"
                )))
            }
        }
    }
}

/// Map a driver error to `StoreUnavailable`, keeping it as the source.
fn db_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::store(format!("Failed to {operation}"), e)
}

/// Whether the error is a unique-constraint violation.
fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}
