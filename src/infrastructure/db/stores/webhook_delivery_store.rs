use crate::infrastructure::db::database::DatabaseError;
use crate::infrastructure::db::dto::{
    ClaimBatch, DeliveryOutcome, WebhookDeliveryRow, WebhookDeliveryStats,
};
use async_trait::async_trait;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookDeliveryRepositoryError {
    NotFound,
    Conflict,
    InvalidInput,
    StorageUnavailable,
}

impl From<DatabaseError> for WebhookDeliveryRepositoryError {
    fn from(_: DatabaseError) -> Self {
        WebhookDeliveryRepositoryError::StorageUnavailable
    }
}

#[async_trait]
pub trait WebhookDeliveryStore: Send + Sync {
    /// Fetch a delivery by its ID. Returns `None` if it doesn't exist.
    async fn get(
        &self,
        delivery_id: uuid::Uuid,
    ) -> Result<Option<WebhookDeliveryRow>, WebhookDeliveryRepositoryError>;
    /// Insert all rows or none of them.
    async fn insert_batch(
        &self,
        rows: &[WebhookDeliveryRow],
    ) -> Result<Vec<WebhookDeliveryRow>, WebhookDeliveryRepositoryError>;
    /// Atomically take ownership of up to `claim.limit` claimable rows, oldest first.
    ///
    /// A row is claimable when it is neither delivered nor skipped, still has
    /// attempts left, is past its `next_attempt_at`, and holds no live claim.
    /// Rows returned here carry `claim.claim_token` until their outcome is recorded
    /// or the lease runs out.
    async fn claim_batch(
        &self,
        claim: ClaimBatch,
    ) -> Result<Vec<WebhookDeliveryRow>, WebhookDeliveryRepositoryError>;
    /// Write an attempt outcome and release the claim.
    ///
    /// Applies only while `claim_token` still owns the row; returns `None` when
    /// the claim was lost.
    async fn record_outcome(
        &self,
        delivery_id: uuid::Uuid,
        claim_token: uuid::Uuid,
        now: OffsetDateTime,
        outcome: &DeliveryOutcome,
    ) -> Result<Option<WebhookDeliveryRow>, WebhookDeliveryRepositoryError>;
    /// Most recent deliveries of a salon's webhook, newest first.
    async fn list_by_webhook(
        &self,
        webhook_id: uuid::Uuid,
        salon_id: uuid::Uuid,
        limit: u32,
    ) -> Result<Vec<WebhookDeliveryRow>, WebhookDeliveryRepositoryError>;
    /// Aggregate delivery counts for a salon.
    async fn stats(
        &self,
        salon_id: uuid::Uuid,
        max_attempts: u32,
        day_start: OffsetDateTime,
    ) -> Result<WebhookDeliveryStats, WebhookDeliveryRepositoryError>;
}

/// A delivery store used when persistence is not configured.
pub struct DisabledWebhookDeliveryStore;

#[async_trait]
impl WebhookDeliveryStore for DisabledWebhookDeliveryStore {
    async fn get(
        &self,
        _delivery_id: uuid::Uuid,
    ) -> Result<Option<WebhookDeliveryRow>, WebhookDeliveryRepositoryError> {
        Err(WebhookDeliveryRepositoryError::StorageUnavailable)
    }

    async fn insert_batch(
        &self,
        _rows: &[WebhookDeliveryRow],
    ) -> Result<Vec<WebhookDeliveryRow>, WebhookDeliveryRepositoryError> {
        Err(WebhookDeliveryRepositoryError::StorageUnavailable)
    }

    async fn claim_batch(
        &self,
        _claim: ClaimBatch,
    ) -> Result<Vec<WebhookDeliveryRow>, WebhookDeliveryRepositoryError> {
        Err(WebhookDeliveryRepositoryError::StorageUnavailable)
    }

    async fn record_outcome(
        &self,
        _delivery_id: uuid::Uuid,
        _claim_token: uuid::Uuid,
        _now: OffsetDateTime,
        _outcome: &DeliveryOutcome,
    ) -> Result<Option<WebhookDeliveryRow>, WebhookDeliveryRepositoryError> {
        Err(WebhookDeliveryRepositoryError::StorageUnavailable)
    }

    async fn list_by_webhook(
        &self,
        _webhook_id: uuid::Uuid,
        _salon_id: uuid::Uuid,
        _limit: u32,
    ) -> Result<Vec<WebhookDeliveryRow>, WebhookDeliveryRepositoryError> {
        Err(WebhookDeliveryRepositoryError::StorageUnavailable)
    }

    async fn stats(
        &self,
        _salon_id: uuid::Uuid,
        _max_attempts: u32,
        _day_start: OffsetDateTime,
    ) -> Result<WebhookDeliveryStats, WebhookDeliveryRepositoryError> {
        Err(WebhookDeliveryRepositoryError::StorageUnavailable)
    }
}
