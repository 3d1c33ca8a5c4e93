use crate::domain::value_objects::event_type::EventType;
use crate::domain::value_objects::ids::{SalonId, WebhookId};
use crate::domain::value_objects::secret::SigningSecret;
use crate::domain::value_objects::timestamps::Timestamp;

/// A salon's subscription to one or more event types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Webhook {
    pub id: WebhookId,
    pub salon_id: SalonId,
    pub name: String,
    pub url: String,
    pub events: Vec<EventType>,
    pub secret: SigningSecret,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Read-side view of a webhook. Carries no secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookSummary {
    pub id: WebhookId,
    pub salon_id: SalonId,
    pub name: String,
    pub url: String,
    pub events: Vec<EventType>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Webhook {
    /// Build a new, active webhook. Inputs are expected to be validated already.
    pub fn new(
        salon_id: SalonId,
        name: String,
        url: String,
        events: Vec<EventType>,
        secret: SigningSecret,
    ) -> Self {
        let now = Timestamp::now_utc();
        Self {
            id: WebhookId::new(),
            salon_id,
            name,
            url,
            events,
            secret,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether a newly fired event of this type should be queued for this webhook.
    pub fn matches(&self, event_type: &EventType) -> bool {
        self.is_active && self.events.contains(event_type)
    }

    pub fn summary(&self) -> WebhookSummary {
        WebhookSummary {
            id: self.id,
            salon_id: self.salon_id,
            name: self.name.clone(),
            url: self.url.clone(),
            events: self.events.clone(),
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<Webhook> for WebhookSummary {
    fn from(webhook: Webhook) -> Self {
        WebhookSummary {
            id: webhook.id,
            salon_id: webhook.salon_id,
            name: webhook.name,
            url: webhook.url,
            events: webhook.events,
            is_active: webhook.is_active,
            created_at: webhook.created_at,
            updated_at: webhook.updated_at,
        }
    }
}
