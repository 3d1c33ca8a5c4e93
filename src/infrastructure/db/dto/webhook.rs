use crate::domain::entities::webhook::{Webhook, WebhookSummary};
use crate::domain::value_objects::event_type::EventType;
use crate::domain::value_objects::ids::{SalonId, WebhookId};
use crate::domain::value_objects::secret::SigningSecret;
use crate::domain::value_objects::timestamps::Timestamp;
use time::OffsetDateTime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WebhookRow {
    pub id: uuid::Uuid,
    pub salon_id: uuid::Uuid,
    pub name: String,
    pub url: String,
    pub events: Vec<String>,
    pub secret: String,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl WebhookRow {
    pub fn from_webhook(webhook: &Webhook) -> Self {
        Self {
            id: webhook.id.0,
            salon_id: webhook.salon_id.0,
            name: webhook.name.clone(),
            url: webhook.url.clone(),
            events: webhook.events.iter().map(|e| e.as_str().to_string()).collect(),
            secret: webhook.secret.expose().to_string(),
            is_active: webhook.is_active,
            created_at: webhook.created_at.as_inner(),
            updated_at: webhook.updated_at.as_inner(),
        }
    }

    pub fn into_webhook(self) -> Webhook {
        Webhook {
            id: WebhookId(self.id),
            salon_id: SalonId(self.salon_id),
            name: self.name,
            url: self.url,
            events: self.events.into_iter().map(EventType::from_stored).collect(),
            secret: SigningSecret::from_stored(self.secret),
            is_active: self.is_active,
            created_at: Timestamp::from(self.created_at),
            updated_at: Timestamp::from(self.updated_at),
        }
    }

    pub fn into_summary(self) -> WebhookSummary {
        WebhookSummary::from(self.into_webhook())
    }
}
