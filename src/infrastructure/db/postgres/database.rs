use crate::config::Db;
use crate::infrastructure::db::database::{Database, DatabaseError};
use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::postgres::{PgConnection, PgPoolOptions};
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Duration;
use tracing::{info, warn};

/// Pool size used by `connect` when no `[db]` section is at hand.
const TOOL_POOL_SIZE: u32 = 5;
const TOOL_ACQUIRE_TIMEOUT_MS: u64 = 5_000;

fn unavailable(e: sqlx::Error) -> DatabaseError {
    DatabaseError::Connection(e.to_string())
}

fn failed(e: sqlx::Error) -> DatabaseError {
    DatabaseError::Query(e.to_string())
}

/// Shared Postgres pool behind both webhook stores.
pub struct PostgresDatabase {
    pool: PgPool,
}

impl PostgresDatabase {
    /// Connect to `url` with a small pool, for tests and one-off tools.
    pub async fn connect(url: &str) -> Result<Self, DatabaseError> {
        Self::connect_with(&Db {
            url: url.to_string(),
            max_connections: TOOL_POOL_SIZE,
            acquire_timeout_ms: TOOL_ACQUIRE_TIMEOUT_MS,
        })
        .await
    }

    /// Connect using the `[db]` settings section. Fails fast when the server is unreachable.
    pub async fn connect_with(settings: &Db) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections.max(1))
            .acquire_timeout(Duration::from_millis(settings.acquire_timeout_ms))
            .connect(&settings.url)
            .await
            .map_err(unavailable)?;

        info!(
            max_connections = settings.max_connections,
            acquire_timeout_ms = settings.acquire_timeout_ms,
            "postgres pool ready"
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run `f` on one pooled connection.
    pub async fn with_conn<T, E, F>(&self, f: F) -> Result<T, E>
    where
        for<'c> F: FnOnce(&'c mut PgConnection) -> BoxFuture<'c, Result<T, E>>,
        E: From<DatabaseError>,
    {
        let mut conn = self.pool.acquire().await.map_err(unavailable)?;
        f(&mut conn).await
    }

    /// Run `f` inside one transaction. Commits on `Ok`, rolls back on `Err`.
    pub async fn with_tx<T, E, F>(&self, f: F) -> Result<T, E>
    where
        for<'c> F: FnOnce(&'c mut Transaction<'_, Postgres>) -> BoxFuture<'c, Result<T, E>>,
        E: From<DatabaseError>,
    {
        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        let value = match f(&mut tx).await {
            Ok(value) => value,
            Err(err) => {
                if let Err(e) = tx.rollback().await {
                    warn!(error = %e, "transaction rollback failed");
                }
                return Err(err);
            }
        };

        tx.commit().await.map_err(failed)?;
        Ok(value)
    }
}

#[async_trait]
impl Database for PostgresDatabase {
    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| ())
            .map_err(failed)
    }
}
