use crate::infrastructure::db::database::DatabaseError;
use crate::infrastructure::db::dto::WebhookRow;
use async_trait::async_trait;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookRepositoryError {
    NotFound,
    Conflict,
    InvalidInput,
    StorageUnavailable,
}

impl From<DatabaseError> for WebhookRepositoryError {
    fn from(_: DatabaseError) -> Self {
        WebhookRepositoryError::StorageUnavailable
    }
}

#[async_trait]
pub trait WebhookStore: Send + Sync {
    /// Fetch a webhook by its ID. Returns `None` if it doesn't exist.
    async fn get(
        &self,
        webhook_id: uuid::Uuid,
    ) -> Result<Option<WebhookRow>, WebhookRepositoryError>;
    /// List every webhook of a salon, oldest first.
    async fn list_by_salon(
        &self,
        salon_id: uuid::Uuid,
    ) -> Result<Vec<WebhookRow>, WebhookRepositoryError>;
    /// List the salon's active webhooks subscribed to `event_type`.
    async fn list_subscribed(
        &self,
        salon_id: uuid::Uuid,
        event_type: &str,
    ) -> Result<Vec<WebhookRow>, WebhookRepositoryError>;
    /// Create a webhook and return exactly what was stored in the database.
    async fn insert(&self, row: &WebhookRow) -> Result<WebhookRow, WebhookRepositoryError>;
    /// Flip the active flag of a salon's webhook. Returns `NotFound` for other salons.
    async fn set_active(
        &self,
        webhook_id: uuid::Uuid,
        salon_id: uuid::Uuid,
        is_active: bool,
        now: OffsetDateTime,
    ) -> Result<WebhookRow, WebhookRepositoryError>;
    /// Delete a salon's webhook. Returns `NotFound` if it doesn't exist.
    async fn delete(
        &self,
        webhook_id: uuid::Uuid,
        salon_id: uuid::Uuid,
    ) -> Result<(), WebhookRepositoryError>;
}

/// A webhook store used when persistence is not configured.
pub struct DisabledWebhookStore;

#[async_trait]
impl WebhookStore for DisabledWebhookStore {
    async fn get(
        &self,
        _webhook_id: uuid::Uuid,
    ) -> Result<Option<WebhookRow>, WebhookRepositoryError> {
        Err(WebhookRepositoryError::StorageUnavailable)
    }

    async fn list_by_salon(
        &self,
        _salon_id: uuid::Uuid,
    ) -> Result<Vec<WebhookRow>, WebhookRepositoryError> {
        Err(WebhookRepositoryError::StorageUnavailable)
    }

    async fn list_subscribed(
        &self,
        _salon_id: uuid::Uuid,
        _event_type: &str,
    ) -> Result<Vec<WebhookRow>, WebhookRepositoryError> {
        Err(WebhookRepositoryError::StorageUnavailable)
    }

    async fn insert(&self, _row: &WebhookRow) -> Result<WebhookRow, WebhookRepositoryError> {
        Err(WebhookRepositoryError::StorageUnavailable)
    }

    async fn set_active(
        &self,
        _webhook_id: uuid::Uuid,
        _salon_id: uuid::Uuid,
        _is_active: bool,
        _now: OffsetDateTime,
    ) -> Result<WebhookRow, WebhookRepositoryError> {
        Err(WebhookRepositoryError::StorageUnavailable)
    }

    async fn delete(
        &self,
        _webhook_id: uuid::Uuid,
        _salon_id: uuid::Uuid,
    ) -> Result<(), WebhookRepositoryError> {
        Err(WebhookRepositoryError::StorageUnavailable)
    }
}
