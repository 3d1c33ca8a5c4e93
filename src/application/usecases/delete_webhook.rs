// Use case: delete_webhook.

use crate::application::context::AppContext;
use crate::domain::value_objects::ids::{SalonId, WebhookId};
use crate::infrastructure::db::stores::webhook_store::WebhookRepositoryError;
use thiserror::Error;
use tracing::info;

/// Removes a salon's webhook. Queued deliveries for it are skipped by the worker.
pub struct DeleteWebhookUseCase;

#[derive(Debug, Error)]
pub enum DeleteWebhookError {
    #[error("webhook not found")]
    NotFound,
    #[error("storage error: {0}")]
    Storage(String),
}

impl DeleteWebhookUseCase {
    pub async fn execute(
        ctx: &AppContext,
        salon_id: SalonId,
        webhook_id: WebhookId,
    ) -> Result<(), DeleteWebhookError> {
        ctx.repos
            .webhook
            .delete(webhook_id, salon_id)
            .await
            .map_err(|e| match e {
                WebhookRepositoryError::NotFound => DeleteWebhookError::NotFound,
                other => DeleteWebhookError::Storage(format!("{other:?}")),
            })?;

        info!(salon_id = %salon_id, webhook_id = %webhook_id, "webhook_deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{DeleteWebhookError, DeleteWebhookUseCase};
    use crate::application::context::test_support::{memory_repositories, test_context};
    use crate::application::usecases::create_webhook::{
        CreateWebhookCommand, CreateWebhookUseCase,
    };
    use crate::domain::value_objects::ids::{SalonId, WebhookId};

    #[tokio::test]
    async fn given_existing_webhook_when_execute_should_remove_it_once() {
        let (repos, webhooks, _) = memory_repositories();
        let mut ctx = test_context();
        ctx.repos = repos;
        let salon = SalonId::new();
        let created = CreateWebhookUseCase::execute(
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
        .unwrap();

        DeleteWebhookUseCase::execute(&ctx, salon, created.webhook.id)
            .await
            .unwrap();
        let again = DeleteWebhookUseCase::execute(&ctx, salon, created.webhook.id).await;

        assert!(webhooks.rows.lock().unwrap().is_empty());
        assert!(matches!(again, Err(DeleteWebhookError::NotFound)));
    }

    #[tokio::test]
    async fn given_unknown_webhook_when_execute_should_return_not_found() {
        let (repos, _, _) = memory_repositories();
        let mut ctx = test_context();
        ctx.repos = repos;

        let err = DeleteWebhookUseCase::execute(&ctx, SalonId::new(), WebhookId::new())
            .await
            .unwrap_err();

        assert!(matches!(err, DeleteWebhookError::NotFound));
    }
}
