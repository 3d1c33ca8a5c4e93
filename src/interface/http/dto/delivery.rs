use crate::application::usecases::delivery_stats::DeliveryStats;
use crate::application::usecases::enqueue_event::EnqueueEventResult;
use crate::application::usecases::process_deliveries::ProcessDeliveriesResult;
use crate::domain::entities::delivery::Delivery;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ProcessQuery {
    pub batch_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ListDeliveriesQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ProcessDeliveriesResponse {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl From<ProcessDeliveriesResult> for ProcessDeliveriesResponse {
    fn from(result: ProcessDeliveriesResult) -> Self {
        Self {
            processed: result.processed,
            succeeded: result.succeeded,
            failed: result.failed,
            skipped: result.skipped,
        }
    }
}

/// Producer call for `POST /internal/events`.
#[derive(Debug, Deserialize)]
pub struct EnqueueEventRequest {
    pub salon_id: String,
    pub event_type: String,
    pub payload: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct EnqueueEventResponse {
    pub enqueued: usize,
    pub delivery_ids: Vec<String>,
}

impl From<EnqueueEventResult> for EnqueueEventResponse {
    fn from(result: EnqueueEventResult) -> Self {
        Self {
            enqueued: result.enqueued,
            delivery_ids: result.delivery_ids.iter().map(|id| id.to_string()).collect(),
        }
    }
}

/// One delivery row for the admin UI. The payload stays server-side.
#[derive(Debug, Serialize)]
pub struct DeliveryResponse {
    pub id: String,
    pub webhook_id: String,
    pub event_type: String,
    pub state: &'static str,
    pub attempt_count: u32,
    pub last_error: Option<String>,
    pub response_status: Option<u16>,
    pub next_attempt_at: Option<String>,
    pub delivered_at: Option<String>,
    pub skipped_at: Option<String>,
    pub created_at: String,
}

impl DeliveryResponse {
    pub fn from_delivery(delivery: &Delivery, max_attempts: u32) -> Self {
        Self {
            id: delivery.id.to_string(),
            webhook_id: delivery.webhook_id.to_string(),
            event_type: delivery.event_type.as_str().to_string(),
            state: delivery.state(max_attempts).as_str(),
            attempt_count: delivery.attempt_count,
            last_error: delivery.last_error.clone(),
            response_status: delivery.response_status,
            next_attempt_at: delivery.next_attempt_at.map(|t| t.to_rfc3339()),
            delivered_at: delivery.delivered_at.map(|t| t.to_rfc3339()),
            skipped_at: delivery.skipped_at.map(|t| t.to_rfc3339()),
            created_at: delivery.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListDeliveriesResponse {
    pub deliveries: Vec<DeliveryResponse>,
}

#[derive(Debug, Serialize)]
pub struct DeliveryStatsResponse {
    pub pending: u64,
    pub delivered: u64,
    pub failed: u64,
    pub skipped: u64,
    pub delivered_today: u64,
}

impl From<DeliveryStats> for DeliveryStatsResponse {
    fn from(stats: DeliveryStats) -> Self {
        Self {
            pending: stats.pending,
            delivered: stats.delivered,
            failed: stats.failed,
            skipped: stats.skipped,
            delivered_today: stats.delivered_today,
        }
    }
}
