// Use case: create_webhook.

use crate::application::context::AppContext;
use crate::domain::entities::webhook::{Webhook, WebhookSummary};
use crate::domain::value_objects::event_type::{EventType, parse_event_set};
use crate::domain::value_objects::ids::SalonId;
use crate::domain::value_objects::secret::SigningSecret;
use crate::infrastructure::db::stores::webhook_store::WebhookRepositoryError;
use thiserror::Error;
use tracing::info;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_URL_LEN: usize = 2048;

/// Registers a salon's webhook and hands its signing secret back once.
pub struct CreateWebhookUseCase;

#[derive(Debug, Error)]
pub enum CreateWebhookError {
    #[error("{0}")]
    Validation(String),
    #[error("webhook already exists")]
    Conflict,
    #[error("storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Clone)]
pub struct CreateWebhookCommand {
    pub salon_id: SalonId,
    pub name: String,
    pub url: String,
    /// `None` subscribes to the default booking events.
    pub events: Option<Vec<String>>,
    /// `None` generates a fresh secret.
    pub secret: Option<String>,
}

/// The only read of a webhook that carries its secret.
#[derive(Debug, Clone)]
pub struct CreatedWebhook {
    pub webhook: WebhookSummary,
    pub secret: String,
}

/// Check that `raw` is an absolute http(s) URL and return it trimmed.
pub fn validate_url(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("url must not be empty".to_string());
    }
    if trimmed.len() > MAX_URL_LEN {
        return Err(format!("url must be at most {MAX_URL_LEN} characters"));
    }
    let parsed = url::Url::parse(trimmed).map_err(|e| format!("url is not valid: {e}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err("url scheme must be http or https".to_string());
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err("url must include a host".to_string());
    }
    Ok(trimmed.to_string())
}

fn validate_name(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("name must not be empty".to_string());
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(format!("name must be at most {MAX_NAME_LEN} characters"));
    }
    Ok(trimmed.to_string())
}

fn validate_events(raw: Option<&[String]>) -> Result<Vec<EventType>, String> {
    let Some(raw) = raw else {
        return Ok(EventType::defaults());
    };
    if raw.is_empty() {
        return Err("events must not be empty".to_string());
    }
    parse_event_set(raw).map_err(|e| e.to_string())
}

impl CreateWebhookUseCase {
    /// Validate input, persist an active webhook and return it with its secret.
    pub async fn execute(
        ctx: &AppContext,
        cmd: CreateWebhookCommand,
    ) -> Result<CreatedWebhook, CreateWebhookError> {
        // Step 1: Validate every field before touching storage.
        let name = validate_name(&cmd.name).map_err(CreateWebhookError::Validation)?;
        let url = validate_url(&cmd.url).map_err(CreateWebhookError::Validation)?;
        let events =
            validate_events(cmd.events.as_deref()).map_err(CreateWebhookError::Validation)?;
        let secret = match cmd.secret.as_deref() {
            Some(raw) => SigningSecret::from_supplied(raw).ok_or_else(|| {
                CreateWebhookError::Validation("secret must not be blank".to_string())
            })?,
            None => SigningSecret::generate(),
        };

        // Step 2: Persist the webhook.
        let webhook = Webhook::new(cmd.salon_id, name, url, events, secret);
        let stored = ctx
            .repos
            .webhook
            .insert(&webhook)
            .await
            .map_err(|e| match e {
                WebhookRepositoryError::Conflict => CreateWebhookError::Conflict,
                other => CreateWebhookError::Storage(format!("{other:?}")),
            })?;

        info!(
            salon_id = %stored.salon_id,
            webhook_id = %stored.id,
            events = stored.events.len(),
            "webhook_created"
        );

        // Step 3: Return the summary together with the secret.
        Ok(CreatedWebhook {
            secret: stored.secret.expose().to_string(),
            webhook: stored.summary(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{CreateWebhookCommand, CreateWebhookError, CreateWebhookUseCase, validate_url};
    use crate::application::context::test_support::{memory_repositories, test_context};
    use crate::domain::value_objects::ids::SalonId;

    fn command(url: &str) -> CreateWebhookCommand {
        CreateWebhookCommand {
            salon_id: SalonId::new(),
            name: "  Calendar sync ".to_string(),
            url: url.to_string(),
            events: None,
            secret: None,
        }
    }

    #[test]
    fn given_urls_when_validate_url_should_accept_only_absolute_http() {
        assert!(validate_url("https://example.com/hook").is_ok());
        assert!(validate_url("http://127.0.0.1:8080/x").is_ok());
        assert!(validate_url("not-a-url").is_err());
        assert!(validate_url("ftp://example.com/file").is_err());
        assert!(validate_url("   ").is_err());
    }

    #[tokio::test]
    async fn given_defaults_when_execute_should_store_active_webhook_with_generated_secret() {
        let (repos, webhooks, _) = memory_repositories();
        let mut ctx = test_context();
        ctx.repos = repos;

        let created = CreateWebhookUseCase::execute(&ctx, command("https://example.com/hook"))
            .await
            .unwrap();

        assert!(created.secret.starts_with("whsec_"));
        assert_eq!(created.webhook.name, "Calendar sync");
        assert!(created.webhook.is_active);
        let names: Vec<&str> = created.webhook.events.iter().map(|e| e.as_str()).collect();
        assert_eq!(
            names,
            vec!["booking.created", "booking.updated", "booking.cancelled"]
        );
        assert_eq!(webhooks.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn given_not_a_url_when_execute_should_fail_validation_and_persist_nothing() {
        let (repos, webhooks, _) = memory_repositories();
        let mut ctx = test_context();
        ctx.repos = repos;

        let err = CreateWebhookUseCase::execute(&ctx, command("not-a-url"))
            .await
            .unwrap_err();

        assert!(matches!(err, CreateWebhookError::Validation(_)));
        assert!(webhooks.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn given_explicit_events_when_execute_should_dedupe_and_keep_supplied_secret() {
        let (repos, _, _) = memory_repositories();
        let mut ctx = test_context();
        ctx.repos = repos;
        let mut cmd = command("https://example.com/hook");
        cmd.events = Some(vec![
            "booking.created".to_string(),
            "booking.created".to_string(),
            "client.updated".to_string(),
        ]);
        cmd.secret = Some("my-shared-secret".to_string());

        let created = CreateWebhookUseCase::execute(&ctx, cmd).await.unwrap();

        assert_eq!(created.webhook.events.len(), 2);
        assert_eq!(created.secret, "my-shared-secret");
    }

    #[tokio::test]
    async fn given_empty_events_or_blank_name_when_execute_should_fail_validation() {
        let ctx = test_context();
        let mut empty_events = command("https://example.com/hook");
        empty_events.events = Some(Vec::new());
        let mut blank_name = command("https://example.com/hook");
        blank_name.name = "   ".to_string();

        let first = CreateWebhookUseCase::execute(&ctx, empty_events).await;
        let second = CreateWebhookUseCase::execute(&ctx, blank_name).await;

        assert!(matches!(first, Err(CreateWebhookError::Validation(_))));
        assert!(matches!(second, Err(CreateWebhookError::Validation(_))));
    }

    #[tokio::test]
    async fn given_storage_down_when_execute_should_return_storage_error() {
        let ctx = test_context();

        let err = CreateWebhookUseCase::execute(&ctx, command("https://example.com/hook"))
            .await
            .unwrap_err();

        assert!(matches!(err, CreateWebhookError::Storage(_)));
    }
}
