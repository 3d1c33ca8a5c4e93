use crate::domain::entities::webhook::Webhook;
use crate::domain::value_objects::event_type::EventType;
use crate::domain::value_objects::ids::{DeliveryId, SalonId, WebhookId};
use crate::domain::value_objects::timestamps::Timestamp;

/// One queued-or-attempted transmission of an event payload to a webhook.
///
/// The payload is kept as the exact bytes the producer handed over; the worker
/// posts them unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub id: DeliveryId,
    pub webhook_id: WebhookId,
    pub salon_id: SalonId,
    pub event_type: EventType,
    pub payload: Vec<u8>,
    pub attempt_count: u32,
    pub last_error: Option<String>,
    pub response_status: Option<u16>,
    pub next_attempt_at: Option<Timestamp>,
    pub delivered_at: Option<Timestamp>,
    pub skipped_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryState {
    Pending,
    Delivered,
    Failed,
    Skipped,
}

impl DeliveryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryState::Pending => "pending",
            DeliveryState::Delivered => "delivered",
            DeliveryState::Failed => "failed",
            DeliveryState::Skipped => "skipped",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, DeliveryState::Pending)
    }
}

/// Why a claimed delivery was skipped without an HTTP attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    WebhookMissing,
    WebhookInactive,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::WebhookMissing => "webhook_missing",
            SkipReason::WebhookInactive => "webhook_inactive",
        }
    }
}

impl Delivery {
    /// Queue a payload for a webhook that subscribes to `event_type`.
    pub fn enqueue(webhook: &Webhook, event_type: EventType, payload: Vec<u8>) -> Self {
        let now = Timestamp::now_utc();
        Self {
            id: DeliveryId::new(),
            webhook_id: webhook.id,
            salon_id: webhook.salon_id,
            event_type,
            payload,
            attempt_count: 0,
            last_error: None,
            response_status: None,
            next_attempt_at: None,
            delivered_at: None,
            skipped_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Classify the row. Exhaustion depends on the configured attempt budget.
    pub fn state(&self, max_attempts: u32) -> DeliveryState {
        if self.delivered_at.is_some() {
            DeliveryState::Delivered
        } else if self.skipped_at.is_some() {
            DeliveryState::Skipped
        } else if self.attempt_count >= max_attempts {
            DeliveryState::Failed
        } else {
            DeliveryState::Pending
        }
    }

    /// Whether a worker may claim this row at `now`.
    pub fn is_claimable(&self, now: Timestamp, max_attempts: u32) -> bool {
        self.state(max_attempts) == DeliveryState::Pending
            && self.next_attempt_at.is_none_or(|at| at <= now)
    }
}
