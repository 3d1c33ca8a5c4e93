// Use case: test_webhook.

use crate::application::context::AppContext;
use crate::domain::value_objects::event_type::EventType;
use crate::domain::value_objects::ids::{SalonId, WebhookId};
use crate::domain::value_objects::timestamps::Timestamp;
use crate::infrastructure::outbound::webhook_client::{DeliveryAttempt, OutboundWebhook};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

/// Sends one signed sample request straight to a webhook, bypassing the queue.
pub struct TestWebhookUseCase;

#[derive(Debug, Error)]
pub enum TestWebhookError {
    #[error("webhook not found")]
    NotFound,
    #[error("storage error: {0}")]
    Storage(String),
    #[error("payload encoding failed: {0}")]
    Encoding(String),
}

/// Outcome of the synchronous send. Receiver failures land here, not in the error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestWebhookResult {
    pub success: bool,
    pub status_code: Option<u16>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
struct TestPayload<'a> {
    event: &'a str,
    webhook_id: String,
    salon_id: String,
    sent_at: String,
    message: &'a str,
}

impl TestWebhookUseCase {
    pub async fn execute(
        ctx: &AppContext,
        salon_id: SalonId,
        webhook_id: WebhookId,
    ) -> Result<TestWebhookResult, TestWebhookError> {
        // Step 1: Resolve the webhook within the caller's salon.
        let webhook = ctx
            .repos
            .webhook
            .get(webhook_id)
            .await
            .map_err(|e| TestWebhookError::Storage(format!("{e:?}")))?
            .filter(|w| w.salon_id == salon_id)
            .ok_or(TestWebhookError::NotFound)?;

        // Step 2: Build the sample body.
        let now = Timestamp::now_utc();
        let event = EventType::test();
        let body = serde_json::to_vec(&TestPayload {
            event: event.as_str(),
            webhook_id: webhook.id.to_string(),
            salon_id: webhook.salon_id.to_string(),
            sent_at: now.to_rfc3339(),
            message: "This is a test delivery.",
        })
        .map_err(|e| TestWebhookError::Encoding(e.to_string()))?;

        // Step 3: Send it once, signed like a real delivery.
        let attempt = ctx
            .sender
            .send(OutboundWebhook {
                url: &webhook.url,
                delivery_id: uuid::Uuid::new_v4(),
                event_type: event.as_str(),
                secret: webhook.secret.expose(),
                body: &body,
                timestamp: now.unix_seconds(),
            })
            .await;

        info!(
            salon_id = %salon_id,
            webhook_id = %webhook_id,
            success = attempt.is_success(),
            status = attempt.status(),
            "webhook_test_sent"
        );

        // Step 4: Report the outcome without touching delivery state.
        Ok(match attempt {
            DeliveryAttempt::Delivered { status } => TestWebhookResult {
                success: true,
                status_code: Some(status),
                error: None,
            },
            DeliveryAttempt::Failed { status, error } => TestWebhookResult {
                success: false,
                status_code: status,
                error: Some(error),
            },
        })
    }
}
