// Use case: process_deliveries.

use crate::application::context::AppContext;
use crate::domain::entities::delivery::{Delivery, SkipReason};
use crate::domain::entities::webhook::Webhook;
use crate::domain::value_objects::timestamps::Timestamp;
use crate::domain::workflows::delivery_policy::DeliveryPolicy;
use crate::infrastructure::db::dto::{ClaimBatch, DeliveryOutcome};
use crate::infrastructure::outbound::webhook_client::{DeliveryAttempt, OutboundWebhook};
use futures::{StreamExt, TryStreamExt};
use metrics::counter;
use thiserror::Error;
use tracing::{info, warn};

/// Runs one batch of pending deliveries: claim, sign, send, record.
///
/// Delivery is at-least-once. A receiver can see the same `x-webhook-id` more
/// than once (a lost response, an expired lease) and should de-duplicate on it.
pub struct ProcessDeliveriesUseCase;

#[derive(Debug, Error)]
pub enum ProcessDeliveriesError {
    #[error("storage error: {0}")]
    Storage(String),
}

/// Explicit worker settings, built once per invocation.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub policy: DeliveryPolicy,
    /// In-flight HTTP attempts per batch.
    pub concurrency: usize,
    /// How long a claim stays exclusive.
    pub lease: time::Duration,
}

/// Slack added on top of the worst-case send time for webhook lookups and outcome writes.
pub const LEASE_MARGIN_SECONDS: i64 = 30;

impl WorkerConfig {
    /// Build the config for one run of `batch_size` rows.
    ///
    /// The lease never ends before the slowest possible batch does:
    /// `ceil(batch_size / concurrency)` sequential timeouts plus a margin. A shorter
    /// `claim_lease_seconds` is raised to that bound.
    pub fn from_settings(settings: &crate::config::Delivery, batch_size: u32) -> Self {
        let concurrency = settings.concurrency.max(1);
        let rounds = u64::from(batch_size.max(1)).div_ceil(concurrency as u64);
        let worst_case_ms = rounds
            .saturating_mul(settings.request_timeout_ms)
            .saturating_add(LEASE_MARGIN_SECONDS as u64 * 1_000);
        let worst_case =
            time::Duration::milliseconds(i64::try_from(worst_case_ms).unwrap_or(i64::MAX));
        let configured = time::Duration::seconds(settings.claim_lease_seconds.max(1));

        Self {
            policy: DeliveryPolicy {
                max_attempts: settings.max_attempts,
                backoff_initial_ms: settings.backoff_initial_ms,
                backoff_max_ms: settings.backoff_max_ms,
            },
            concurrency,
            lease: configured.max(worst_case),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessDeliveriesResult {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    Succeeded,
    Failed,
    Skipped,
    ClaimLost,
}

impl ItemOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            ItemOutcome::Succeeded => "succeeded",
            ItemOutcome::Failed => "failed",
            ItemOutcome::Skipped => "skipped",
            ItemOutcome::ClaimLost => "claim_lost",
        }
    }
}

impl ProcessDeliveriesUseCase {
    /// Process up to `batch_size` claimable deliveries once.
    ///
    /// Per-delivery failures are recorded on the rows and counted. Only storage
    /// faults abort the batch; rows left mid-flight are re-claimable after their lease.
    pub async fn execute(
        ctx: &AppContext,
        config: &WorkerConfig,
        batch_size: u32,
    ) -> Result<ProcessDeliveriesResult, ProcessDeliveriesError> {
        // Step 1: Claim a batch under a fresh token.
        let now = Timestamp::now_utc();
        let claim_token = uuid::Uuid::new_v4();
        let claimed = ctx
            .repos
            .delivery
            .claim(ClaimBatch {
                claim_token,
                now: now.as_inner(),
                claimed_until: now.plus(config.lease).as_inner(),
                max_attempts: config.policy.max_attempts,
                limit: batch_size,
            })
            .await
            .map_err(|e| ProcessDeliveriesError::Storage(format!("{e:?}")))?;

        if claimed.is_empty() {
            return Ok(ProcessDeliveriesResult::default());
        }

        // Step 2: Attempt every claimed row with bounded parallelism.
        let outcomes: Vec<ItemOutcome> = futures::stream::iter(claimed)
            .map(|delivery| Self::process_one(ctx, config, claim_token, delivery))
            .buffer_unordered(config.concurrency.max(1))
            .try_collect()
            .await?;

        // Step 3: Tally. Rows whose claim was lost belong to another invocation.
        let mut result = ProcessDeliveriesResult::default();
        for outcome in outcomes {
            match outcome {
                ItemOutcome::Succeeded => result.succeeded += 1,
                ItemOutcome::Failed => result.failed += 1,
                ItemOutcome::Skipped => result.skipped += 1,
                ItemOutcome::ClaimLost => continue,
            }
            result.processed += 1;
        }

        info!(
            claim_token = %claim_token,
            processed = result.processed,
            succeeded = result.succeeded,
            failed = result.failed,
            skipped = result.skipped,
            "delivery_batch_processed"
        );
        Ok(result)
    }

    async fn process_one(
        ctx: &AppContext,
        config: &WorkerConfig,
        claim_token: uuid::Uuid,
        delivery: Delivery,
    ) -> Result<ItemOutcome, ProcessDeliveriesError> {
        // Step 1: Resolve the owning webhook; gone or paused means a terminal skip.
        let webhook = ctx
            .repos
            .webhook
            .get(delivery.webhook_id)
            .await
            .map_err(|e| ProcessDeliveriesError::Storage(format!("{e:?}")))?;
        let outcome = match Self::resolve(webhook, &delivery) {
            Err(reason) => DeliveryOutcome::Skipped {
                reason: reason.as_str().to_string(),
            },
            Ok(webhook) => Self::attempt(ctx, &config.policy, &webhook, &delivery).await,
        };

        // Step 2: Record the outcome, conditional on still holding the claim.
        let recorded = ctx
            .repos
            .delivery
            .record(delivery.id, claim_token, Timestamp::now_utc(), &outcome)
            .await
            .map_err(|e| ProcessDeliveriesError::Storage(format!("{e:?}")))?;

        let item = match (&outcome, recorded) {
            (_, None) => {
                warn!(
                    delivery_id = %delivery.id,
                    claim_token = %claim_token,
                    "delivery_claim_lost"
                );
                ItemOutcome::ClaimLost
            }
            (DeliveryOutcome::Delivered { .. }, Some(_)) => ItemOutcome::Succeeded,
            (DeliveryOutcome::Skipped { reason }, Some(_)) => {
                info!(
                    delivery_id = %delivery.id,
                    webhook_id = %delivery.webhook_id,
                    reason = %reason,
                    "delivery_skipped"
                );
                ItemOutcome::Skipped
            }
            (DeliveryOutcome::Failed { error, .. }, Some(row)) => {
                warn!(
                    delivery_id = %delivery.id,
                    webhook_id = %delivery.webhook_id,
                    attempt_count = row.attempt_count,
                    exhausted = !config.policy.can_attempt(row.attempt_count),
                    error = %error,
                    "delivery_attempt_failed"
                );
                ItemOutcome::Failed
            }
        };

        counter!("webhook_deliveries_total", "outcome" => item.as_str()).increment(1);
        Ok(item)
    }

    fn resolve(webhook: Option<Webhook>, delivery: &Delivery) -> Result<Webhook, SkipReason> {
        match webhook {
            Some(webhook) if webhook.salon_id != delivery.salon_id => {
                Err(SkipReason::WebhookMissing)
            }
            Some(webhook) if !webhook.is_active => Err(SkipReason::WebhookInactive),
            Some(webhook) => Ok(webhook),
            None => Err(SkipReason::WebhookMissing),
        }
    }

    async fn attempt(
        ctx: &AppContext,
        policy: &DeliveryPolicy,
        webhook: &Webhook,
        delivery: &Delivery,
    ) -> DeliveryOutcome {
        let sent_at = Timestamp::now_utc();
        let attempt = ctx
            .sender
            .send(OutboundWebhook {
                url: &webhook.url,
                delivery_id: delivery.id.0,
                event_type: delivery.event_type.as_str(),
                secret: webhook.secret.expose(),
                body: &delivery.payload,
                timestamp: sent_at.unix_seconds(),
            })
            .await;

        match attempt {
            DeliveryAttempt::Delivered { status } => DeliveryOutcome::Delivered {
                response_status: i32::from(status),
            },
            DeliveryAttempt::Failed { status, error } => {
                let attempts_after = delivery.attempt_count.saturating_add(1);
                let next_attempt_at = if policy.backoff_initial_ms == 0
                    || !policy.can_attempt(attempts_after)
                {
                    None
                } else {
                    Some(
                        Timestamp::now_utc()
                            .plus(policy.next_delay(attempts_after))
                            .as_inner(),
                    )
                };
                DeliveryOutcome::Failed {
                    response_status: status.map(i32::from),
                    error,
                    next_attempt_at,
                }
            }
        }
    }
}
