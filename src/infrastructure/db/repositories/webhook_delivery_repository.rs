use crate::domain::entities::delivery::Delivery;
use crate::domain::value_objects::ids::{DeliveryId, SalonId, WebhookId};
use crate::domain::value_objects::timestamps::Timestamp;
use crate::infrastructure::db::dto::{
    ClaimBatch, DeliveryOutcome, WebhookDeliveryRow, WebhookDeliveryStats,
};
use crate::infrastructure::db::stores::webhook_delivery_store::{
    WebhookDeliveryRepositoryError, WebhookDeliveryStore,
};
use std::sync::Arc;

pub struct WebhookDeliveryRepository {
    store: Arc<dyn WebhookDeliveryStore>,
}

impl WebhookDeliveryRepository {
    /// Build a repository that uses the given store implementation.
    pub fn new(store: Arc<dyn WebhookDeliveryStore>) -> Self {
        Self { store }
    }

    /// Fetch a delivery by its ID. Returns `None` if it doesn't exist.
    pub async fn get(
        &self,
        delivery_id: DeliveryId,
    ) -> Result<Option<Delivery>, WebhookDeliveryRepositoryError> {
        let row = self.store.get(delivery_id.0).await?;
        Ok(row.map(WebhookDeliveryRow::into_delivery))
    }

    /// Persist a fan-out of deliveries. Either every row is stored or none is.
    pub async fn enqueue_all(
        &self,
        deliveries: &[Delivery],
    ) -> Result<Vec<Delivery>, WebhookDeliveryRepositoryError> {
        let rows: Vec<WebhookDeliveryRow> = deliveries
            .iter()
            .map(WebhookDeliveryRow::from_delivery)
            .collect();
        let stored = self.store.insert_batch(&rows).await?;
        Ok(stored
            .into_iter()
            .map(WebhookDeliveryRow::into_delivery)
            .collect())
    }

    /// Claim up to `claim.limit` deliveries for exclusive processing.
    pub async fn claim(
        &self,
        claim: ClaimBatch,
    ) -> Result<Vec<Delivery>, WebhookDeliveryRepositoryError> {
        let rows = self.store.claim_batch(claim).await?;
        Ok(rows
            .into_iter()
            .map(WebhookDeliveryRow::into_delivery)
            .collect())
    }

    /// Write back an outcome. `Ok(None)` means another worker owns the row now.
    pub async fn record(
        &self,
        delivery_id: DeliveryId,
        claim_token: uuid::Uuid,
        now: Timestamp,
        outcome: &DeliveryOutcome,
    ) -> Result<Option<Delivery>, WebhookDeliveryRepositoryError> {
        let row = self
            .store
            .record_outcome(delivery_id.0, claim_token, now.as_inner(), outcome)
            .await?;
        Ok(row.map(WebhookDeliveryRow::into_delivery))
    }

    pub async fn list_by_webhook(
        &self,
        webhook_id: WebhookId,
        salon_id: SalonId,
        limit: u32,
    ) -> Result<Vec<Delivery>, WebhookDeliveryRepositoryError> {
        let rows = self
            .store
            .list_by_webhook(webhook_id.0, salon_id.0, limit)
            .await?;
        Ok(rows
            .into_iter()
            .map(WebhookDeliveryRow::into_delivery)
            .collect())
    }

    /// Return aggregate delivery counts for a salon.
    pub async fn stats(
        &self,
        salon_id: SalonId,
        max_attempts: u32,
        day_start: Timestamp,
    ) -> Result<WebhookDeliveryStats, WebhookDeliveryRepositoryError> {
        self.store
            .stats(salon_id.0, max_attempts, day_start.as_inner())
            .await
    }
}
