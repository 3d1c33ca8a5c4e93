use crate::domain::entities::delivery::Delivery;
use crate::domain::value_objects::event_type::EventType;
use crate::domain::value_objects::ids::{DeliveryId, SalonId, WebhookId};
use crate::domain::value_objects::timestamps::Timestamp;
use time::OffsetDateTime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WebhookDeliveryRow {
    pub id: uuid::Uuid,
    pub webhook_id: uuid::Uuid,
    pub salon_id: uuid::Uuid,
    pub event_type: String,
    pub payload: Vec<u8>,
    pub attempt_count: i32,
    pub last_error: Option<String>,
    pub response_status: Option<i32>,
    pub next_attempt_at: Option<OffsetDateTime>,
    pub claim_token: Option<uuid::Uuid>,
    pub claimed_until: Option<OffsetDateTime>,
    pub delivered_at: Option<OffsetDateTime>,
    pub skipped_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Delivery counts for one salon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct WebhookDeliveryStats {
    pub pending: i64,
    pub delivered: i64,
    pub failed: i64,
    pub skipped: i64,
    pub delivered_today: i64,
}

/// Parameters of one atomic claim.
#[derive(Debug, Clone, Copy)]
pub struct ClaimBatch {
    pub claim_token: uuid::Uuid,
    pub now: OffsetDateTime,
    pub claimed_until: OffsetDateTime,
    pub max_attempts: u32,
    pub limit: u32,
}

/// Outcome written back for a claimed row.
#[derive(Debug, Clone)]
pub enum DeliveryOutcome {
    Delivered {
        response_status: i32,
    },
    Failed {
        response_status: Option<i32>,
        error: String,
        next_attempt_at: Option<OffsetDateTime>,
    },
    Skipped {
        reason: String,
    },
}

impl WebhookDeliveryRow {
    pub fn from_delivery(delivery: &Delivery) -> Self {
        Self {
            id: delivery.id.0,
            webhook_id: delivery.webhook_id.0,
            salon_id: delivery.salon_id.0,
            event_type: delivery.event_type.as_str().to_string(),
            payload: delivery.payload.clone(),
            attempt_count: i32::try_from(delivery.attempt_count).unwrap_or(i32::MAX),
            last_error: delivery.last_error.clone(),
            response_status: delivery.response_status.map(i32::from),
            next_attempt_at: delivery.next_attempt_at.map(|t| t.as_inner()),
            claim_token: None,
            claimed_until: None,
            delivered_at: delivery.delivered_at.map(|t| t.as_inner()),
            skipped_at: delivery.skipped_at.map(|t| t.as_inner()),
            created_at: delivery.created_at.as_inner(),
            updated_at: delivery.updated_at.as_inner(),
        }
    }

    pub fn into_delivery(self) -> Delivery {
        Delivery {
            id: DeliveryId(self.id),
            webhook_id: WebhookId(self.webhook_id),
            salon_id: SalonId(self.salon_id),
            event_type: EventType::from_stored(self.event_type),
            payload: self.payload,
            attempt_count: u32::try_from(self.attempt_count).unwrap_or(0),
            last_error: self.last_error,
            response_status: self.response_status.and_then(|s| u16::try_from(s).ok()),
            next_attempt_at: self.next_attempt_at.map(Timestamp::from),
            delivered_at: self.delivered_at.map(Timestamp::from),
            skipped_at: self.skipped_at.map(Timestamp::from),
            created_at: Timestamp::from(self.created_at),
            updated_at: Timestamp::from(self.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::WebhookDeliveryRow;
    use crate::domain::entities::delivery::Delivery;
    use crate::domain::entities::webhook::Webhook;
    use crate::domain::value_objects::event_type::EventType;
    use crate::domain::value_objects::ids::SalonId;
    use crate::domain::value_objects::secret::SigningSecret;

    fn sample_delivery() -> Delivery {
        let webhook = Webhook::new(
            SalonId::new(),
            "crm".to_string(),
            "https://example.com/hook".to_string(),
            EventType::defaults(),
            SigningSecret::generate(),
        );
        Delivery::enqueue(
            &webhook,
            EventType::parse("booking.updated").unwrap(),
            b" {\"a\" : 1} ".to_vec(),
        )
    }

    #[test]
    fn given_delivery_when_round_tripped_through_row_should_keep_payload_bytes() {
        let delivery = sample_delivery();
        let row = WebhookDeliveryRow::from_delivery(&delivery);

        assert_eq!(row.attempt_count, 0);
        assert!(row.claim_token.is_none());
        assert_eq!(row.payload, b" {\"a\" : 1} ".to_vec());
        assert_eq!(row.into_delivery(), delivery);
    }
}
