use crate::application::usecases::create_webhook::CreatedWebhook;
use crate::application::usecases::test_webhook::TestWebhookResult;
use crate::domain::entities::webhook::WebhookSummary;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateWebhookRequest {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub events: Option<Vec<String>>,
    #[serde(default)]
    pub secret: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateWebhookRequest {
    pub is_active: bool,
}

/// Public view of a webhook. There is deliberately no `secret` field.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub id: String,
    pub salon_id: String,
    pub name: String,
    pub url: String,
    pub events: Vec<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&WebhookSummary> for WebhookResponse {
    fn from(summary: &WebhookSummary) -> Self {
        Self {
            id: summary.id.to_string(),
            salon_id: summary.salon_id.to_string(),
            name: summary.name.clone(),
            url: summary.url.clone(),
            events: summary
                .events
                .iter()
                .map(|e| e.as_str().to_string())
                .collect(),
            is_active: summary.is_active,
            created_at: summary.created_at.to_rfc3339(),
            updated_at: summary.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateWebhookResponse {
    #[serde(flatten)]
    pub webhook: WebhookResponse,
    /// Returned here and nowhere else.
    pub secret: String,
}

impl From<CreatedWebhook> for CreateWebhookResponse {
    fn from(created: CreatedWebhook) -> Self {
        Self {
            webhook: WebhookResponse::from(&created.webhook),
            secret: created.secret,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListWebhooksResponse {
    pub webhooks: Vec<WebhookResponse>,
}

#[derive(Debug, Serialize)]
pub struct TestWebhookResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<TestWebhookResult> for TestWebhookResponse {
    fn from(result: TestWebhookResult) -> Self {
        Self {
            success: result.success,
            status_code: result.status_code,
            error: result.error,
        }
    }
}
