// Use case: delivery_stats.

use crate::application::context::AppContext;
use crate::domain::value_objects::ids::SalonId;
use crate::domain::value_objects::timestamps::Timestamp;
use thiserror::Error;

/// Delivery counts of one salon, for monitoring.
pub struct DeliveryStatsUseCase;

#[derive(Debug, Error)]
pub enum DeliveryStatsError {
    #[error("storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub pending: u64,
    pub delivered: u64,
    pub failed: u64,
    pub skipped: u64,
    /// Delivered since midnight UTC of `now`.
    pub delivered_today: u64,
}

impl DeliveryStatsUseCase {
    pub async fn execute(
        ctx: &AppContext,
        salon_id: SalonId,
        now: Timestamp,
    ) -> Result<DeliveryStats, DeliveryStatsError> {
        let stats = ctx
            .repos
            .delivery
            .stats(
                salon_id,
                ctx.settings.delivery.max_attempts,
                now.start_of_day(),
            )
            .await
            .map_err(|e| DeliveryStatsError::Storage(format!("{e:?}")))?;

        let count = |value: i64| u64::try_from(value).unwrap_or(0);
        Ok(DeliveryStats {
            pending: count(stats.pending),
            delivered: count(stats.delivered),
            failed: count(stats.failed),
            skipped: count(stats.skipped),
            delivered_today: count(stats.delivered_today),
        })
    }
}
