use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),
}

/// Minimal surface `/ready` needs from the store.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run a trivial round trip to prove the store is reachable.
    async fn ping(&self) -> Result<(), DatabaseError>;
}
