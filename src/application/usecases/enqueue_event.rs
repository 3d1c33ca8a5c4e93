// Use case: enqueue_event.

use crate::application::context::AppContext;
use crate::domain::entities::delivery::Delivery;
use crate::domain::value_objects::event_type::EventType;
use crate::domain::value_objects::ids::{DeliveryId, SalonId};
use metrics::counter;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Fans an event out into one pending delivery per matching webhook. No HTTP work.
pub struct EnqueueEventUseCase;

#[derive(Debug, Error)]
pub enum EnqueueEventError {
    #[error("{0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Clone)]
pub struct EnqueueEventCommand {
    pub salon_id: SalonId,
    pub event_type: String,
    /// Opaque body, stored and later posted byte-for-byte.
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnqueueEventResult {
    pub enqueued: usize,
    pub delivery_ids: Vec<DeliveryId>,
}

impl EnqueueEventUseCase {
    pub async fn execute(
        ctx: &AppContext,
        cmd: EnqueueEventCommand,
    ) -> Result<EnqueueEventResult, EnqueueEventError> {
        // Step 1: Validate the event type.
        let event_type = EventType::parse(&cmd.event_type)
            .map_err(|e| EnqueueEventError::Validation(e.to_string()))?;

        // Step 2: Find the salon's active subscribers.
        let webhooks = ctx
            .repos
            .webhook
            .list_subscribed(cmd.salon_id, &event_type)
            .await
            .map_err(|e| EnqueueEventError::Storage(format!("{e:?}")))?;
        if webhooks.is_empty() {
            debug!(
                salon_id = %cmd.salon_id,
                event_type = %event_type,
                "event_has_no_subscribers"
            );
            return Ok(EnqueueEventResult::default());
        }

        // Step 3: Insert one delivery per subscriber in a single transaction.
        let deliveries: Vec<Delivery> = webhooks
            .iter()
            .filter(|w| w.matches(&event_type))
            .map(|w| Delivery::enqueue(w, event_type.clone(), cmd.payload.clone()))
            .collect();
        let stored = ctx
            .repos
            .delivery
            .enqueue_all(&deliveries)
            .await
            .map_err(|e| EnqueueEventError::Storage(format!("{e:?}")))?;

        // Step 4: Emit metrics and logs.
        counter!("webhook_events_enqueued_total", "event_type" => event_type.as_str().to_string())
            .increment(stored.len() as u64);
        info!(
            salon_id = %cmd.salon_id,
            event_type = %event_type,
            enqueued = stored.len(),
            "event_enqueued"
        );

        Ok(EnqueueEventResult {
            enqueued: stored.len(),
            delivery_ids: stored.iter().map(|d| d.id).collect(),
        })
    }

    /// Fire-and-forget entry point for producers. Failures are logged, never returned.
    pub async fn notify(ctx: &AppContext, salon_id: SalonId, event_type: &str, payload: Vec<u8>) {
        let cmd = EnqueueEventCommand {
            salon_id,
            event_type: event_type.to_string(),
            payload,
        };
        if let Err(err) = Self::execute(ctx, cmd).await {
            warn!(
                salon_id = %salon_id,
                event_type,
                error = %err,
                "event_enqueue_failed"
            );
        }
    }
}
