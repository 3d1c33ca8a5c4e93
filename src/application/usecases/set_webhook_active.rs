// Use case: set_webhook_active.

use crate::application::context::AppContext;
use crate::domain::entities::webhook::WebhookSummary;
use crate::domain::value_objects::ids::{SalonId, WebhookId};
use crate::infrastructure::db::stores::webhook_store::WebhookRepositoryError;
use thiserror::Error;
use tracing::info;

/// Pauses or resumes a webhook. Inactive webhooks match no new events.
pub struct SetWebhookActiveUseCase;

#[derive(Debug, Error)]
pub enum SetWebhookActiveError {
    #[error("webhook not found")]
    NotFound,
    #[error("storage error: {0}")]
    Storage(String),
}

impl SetWebhookActiveUseCase {
    pub async fn execute(
        ctx: &AppContext,
        salon_id: SalonId,
        webhook_id: WebhookId,
        is_active: bool,
    ) -> Result<WebhookSummary, SetWebhookActiveError> {
        let updated = ctx
            .repos
            .webhook
            .set_active(webhook_id, salon_id, is_active)
            .await
            .map_err(|e| match e {
                WebhookRepositoryError::NotFound => SetWebhookActiveError::NotFound,
                other => SetWebhookActiveError::Storage(format!("{other:?}")),
            })?;

        info!(
            salon_id = %salon_id,
            webhook_id = %webhook_id,
            is_active,
            "webhook_active_changed"
        );
        Ok(updated)
    }
}
