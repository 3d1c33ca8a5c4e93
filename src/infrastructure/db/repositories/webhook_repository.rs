use crate::domain::entities::webhook::{Webhook, WebhookSummary};
use crate::domain::value_objects::event_type::EventType;
use crate::domain::value_objects::ids::{SalonId, WebhookId};
use crate::domain::value_objects::timestamps::Timestamp;
use crate::infrastructure::db::dto::WebhookRow;
use crate::infrastructure::db::stores::webhook_store::{WebhookRepositoryError, WebhookStore};
use std::sync::Arc;

pub struct WebhookRepository {
    store: Arc<dyn WebhookStore>,
}

impl WebhookRepository {
    /// Build a repository that uses the given store implementation.
    pub fn new(store: Arc<dyn WebhookStore>) -> Self {
        Self { store }
    }

    /// Create a webhook and return what was actually stored in the database.
    pub async fn insert(&self, webhook: &Webhook) -> Result<Webhook, WebhookRepositoryError> {
        let dto = WebhookRow::from_webhook(webhook);
        let stored = self.store.insert(&dto).await?;
        Ok(stored.into_webhook())
    }

    /// Fetch a webhook by its ID. Returns `None` if it doesn't exist.
    pub async fn get(
        &self,
        webhook_id: WebhookId,
    ) -> Result<Option<Webhook>, WebhookRepositoryError> {
        let row = self.store.get(webhook_id.0).await?;
        Ok(row.map(WebhookRow::into_webhook))
    }

    /// List a salon's webhooks without their secrets.
    pub async fn list_by_salon(
        &self,
        salon_id: SalonId,
    ) -> Result<Vec<WebhookSummary>, WebhookRepositoryError> {
        let rows = self.store.list_by_salon(salon_id.0).await?;
        Ok(rows.into_iter().map(WebhookRow::into_summary).collect())
    }

    /// Active webhooks of the salon subscribed to `event_type`.
    pub async fn list_subscribed(
        &self,
        salon_id: SalonId,
        event_type: &EventType,
    ) -> Result<Vec<Webhook>, WebhookRepositoryError> {
        let rows = self
            .store
            .list_subscribed(salon_id.0, event_type.as_str())
            .await?;
        Ok(rows.into_iter().map(WebhookRow::into_webhook).collect())
    }

    pub async fn set_active(
        &self,
        webhook_id: WebhookId,
        salon_id: SalonId,
        is_active: bool,
    ) -> Result<WebhookSummary, WebhookRepositoryError> {
        let row = self
            .store
            .set_active(
                webhook_id.0,
                salon_id.0,
                is_active,
                Timestamp::now_utc().as_inner(),
            )
            .await?;
        Ok(row.into_summary())
    }

    /// Delete a salon's webhook. Returns `NotFound` if it doesn't exist.
    pub async fn delete(
        &self,
        webhook_id: WebhookId,
        salon_id: SalonId,
    ) -> Result<(), WebhookRepositoryError> {
        self.store.delete(webhook_id.0, salon_id.0).await
    }
}
