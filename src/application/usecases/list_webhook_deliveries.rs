// Use case: list_webhook_deliveries.

use crate::application::context::AppContext;
use crate::domain::entities::delivery::Delivery;
use crate::domain::value_objects::ids::{SalonId, WebhookId};
use thiserror::Error;

pub const DEFAULT_LIMIT: u32 = 50;
pub const MAX_LIMIT: u32 = 200;

/// Recent delivery records of one webhook, newest first.
pub struct ListWebhookDeliveriesUseCase;

#[derive(Debug, Error)]
pub enum ListWebhookDeliveriesError {
    #[error("webhook not found")]
    NotFound,
    #[error("storage error: {0}")]
    Storage(String),
}

impl ListWebhookDeliveriesUseCase {
    pub async fn execute(
        ctx: &AppContext,
        salon_id: SalonId,
        webhook_id: WebhookId,
        limit: Option<u32>,
    ) -> Result<Vec<Delivery>, ListWebhookDeliveriesError> {
        // Step 1: The webhook must exist and belong to the salon.
        ctx.repos
            .webhook
            .get(webhook_id)
            .await
            .map_err(|e| ListWebhookDeliveriesError::Storage(format!("{e:?}")))?
            .filter(|w| w.salon_id == salon_id)
            .ok_or(ListWebhookDeliveriesError::NotFound)?;

        // Step 2: Load the most recent rows.
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        ctx.repos
            .delivery
            .list_by_webhook(webhook_id, salon_id, limit)
            .await
            .map_err(|e| ListWebhookDeliveriesError::Storage(format!("{e:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::{ListWebhookDeliveriesError, ListWebhookDeliveriesUseCase};
    use crate::application::context::test_support::{memory_repositories, test_context};
    use crate::application::usecases::create_webhook::{
        CreateWebhookCommand, CreateWebhookUseCase,
    };
    use crate::application::usecases::enqueue_event::{EnqueueEventCommand, EnqueueEventUseCase};
    use crate::domain::value_objects::ids::SalonId;

    #[tokio::test]
    async fn given_deliveries_when_execute_should_return_newest_first_up_to_limit() {
        let (repos, _, _) = memory_repositories();
        let mut ctx = test_context();
        ctx.repos = repos;
        let salon = SalonId::new();
        let webhook_id = CreateWebhookUseCase::execute(
            &ctx,
            CreateWebhookCommand {
                salon_id: salon,
                name: "crm".to_string(),
                url: "https://example.com/hook".to_string(),
                events: None,
                secret: None,
            },
        )
        .await
        .unwrap()
        .webhook
        .id;
        for event in ["booking.created", "booking.updated", "booking.cancelled"] {
            EnqueueEventUseCase::execute(
                &ctx,
                EnqueueEventCommand {
                    salon_id: salon,
                    event_type: event.to_string(),
                    payload: b"{}".to_vec(),
                },
            )
            .await
            .unwrap();
        }

        let listed = ListWebhookDeliveriesUseCase::execute(&ctx, salon, webhook_id, Some(2))
            .await
            .unwrap();
        let foreign =
            ListWebhookDeliveriesUseCase::execute(&ctx, SalonId::new(), webhook_id, None).await;

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].event_type.as_str(), "booking.cancelled");
        assert!(matches!(foreign, Err(ListWebhookDeliveriesError::NotFound)));
    }
}
