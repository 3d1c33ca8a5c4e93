// Use case: list_webhooks.

use crate::application::context::AppContext;
use crate::domain::entities::webhook::WebhookSummary;
use crate::domain::value_objects::ids::SalonId;
use thiserror::Error;

/// Lists a salon's webhooks. Secrets never leave through this path.
pub struct ListWebhooksUseCase;

#[derive(Debug, Error)]
pub enum ListWebhooksError {
    #[error("storage error: {0}")]
    Storage(String),
}

impl ListWebhooksUseCase {
    pub async fn execute(
        ctx: &AppContext,
        salon_id: SalonId,
    ) -> Result<Vec<WebhookSummary>, ListWebhooksError> {
        ctx.repos
            .webhook
            .list_by_salon(salon_id)
            .await
            .map_err(|e| ListWebhooksError::Storage(format!("{e:?}")))
    }
}
