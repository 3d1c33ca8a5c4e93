use crate::infrastructure::db::dto::{
    ClaimBatch, DeliveryOutcome, WebhookDeliveryRow, WebhookDeliveryStats,
};
use crate::infrastructure::db::postgres::PostgresDatabase;
use crate::infrastructure::db::stores::webhook_delivery_store::{
    WebhookDeliveryRepositoryError, WebhookDeliveryStore,
};
use async_trait::async_trait;
use sqlx::PgConnection;
use time::OffsetDateTime;

const DELIVERY_COLUMNS: &str = "id,
    webhook_id,
    salon_id,
    event_type,
    payload,
    attempt_count,
    last_error,
    response_status,
    next_attempt_at,
    claim_token,
    claimed_until,
    delivered_at,
    skipped_at,
    created_at,
    updated_at";

#[derive(Clone)]
pub struct WebhookDeliveryStorePostgres {
    db: std::sync::Arc<PostgresDatabase>,
}

impl WebhookDeliveryStorePostgres {
    /// Build a Postgres-backed webhook delivery store.
    pub fn new(db: std::sync::Arc<PostgresDatabase>) -> Self {
        Self { db }
    }

    async fn get_impl_conn(
        conn: &mut PgConnection,
        delivery_id: uuid::Uuid,
    ) -> Result<Option<WebhookDeliveryRow>, WebhookDeliveryRepositoryError> {
        let row = sqlx::query_as::<_, WebhookDeliveryRow>(&format!(
            "SELECT {DELIVERY_COLUMNS} FROM webhook_deliveries WHERE id = $1"
        ))
        .bind(delivery_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|_| WebhookDeliveryRepositoryError::StorageUnavailable)?;

        Ok(row)
    }

    async fn insert_impl_conn(
        conn: &mut PgConnection,
        row: &WebhookDeliveryRow,
    ) -> Result<WebhookDeliveryRow, WebhookDeliveryRepositoryError> {
        let stored = sqlx::query_as::<_, WebhookDeliveryRow>(&format!(
            "INSERT INTO webhook_deliveries ({DELIVERY_COLUMNS})
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15)
            ON CONFLICT (id) DO NOTHING
            RETURNING {DELIVERY_COLUMNS}"
        ))
        .bind(row.id)
        .bind(row.webhook_id)
        .bind(row.salon_id)
        .bind(&row.event_type)
        .bind(&row.payload)
        .bind(row.attempt_count)
        .bind(&row.last_error)
        .bind(row.response_status)
        .bind(row.next_attempt_at)
        .bind(row.claim_token)
        .bind(row.claimed_until)
        .bind(row.delivered_at)
        .bind(row.skipped_at)
        .bind(row.created_at)
        .bind(row.updated_at)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|_| WebhookDeliveryRepositoryError::StorageUnavailable)?;

        stored.ok_or(WebhookDeliveryRepositoryError::Conflict)
    }

    async fn claim_batch_impl_conn(
        conn: &mut PgConnection,
        claim: ClaimBatch,
    ) -> Result<Vec<WebhookDeliveryRow>, WebhookDeliveryRepositoryError> {
        // Step 1: Lock the oldest claimable rows and stamp them with our token in one statement.
        let mut rows = sqlx::query_as::<_, WebhookDeliveryRow>(&format!(
            "WITH next_deliveries AS (
                SELECT id
                FROM webhook_deliveries
                WHERE delivered_at IS NULL
                  AND skipped_at IS NULL
                  AND attempt_count < $3
                  AND (next_attempt_at IS NULL OR next_attempt_at <= $2)
                  AND (claimed_until IS NULL OR claimed_until <= $2)
                ORDER BY created_at ASC, id ASC
                LIMIT $5
                FOR UPDATE SKIP LOCKED
            )
            UPDATE webhook_deliveries
            SET claim_token = $1,
                claimed_until = $4,
                updated_at = $2
            WHERE id IN (SELECT id FROM next_deliveries)
            RETURNING {DELIVERY_COLUMNS}"
        ))
        .bind(claim.claim_token)
        .bind(claim.now)
        .bind(i32::try_from(claim.max_attempts).unwrap_or(i32::MAX))
        .bind(claim.claimed_until)
        .bind(i64::from(claim.limit))
        .fetch_all(&mut *conn)
        .await
        .map_err(|_| WebhookDeliveryRepositoryError::StorageUnavailable)?;

        // Step 2: RETURNING has no defined order, restore FIFO.
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn record_outcome_impl_conn(
        conn: &mut PgConnection,
        delivery_id: uuid::Uuid,
        claim_token: uuid::Uuid,
        now: OffsetDateTime,
        outcome: &DeliveryOutcome,
    ) -> Result<Option<WebhookDeliveryRow>, WebhookDeliveryRepositoryError> {
        let query = match outcome {
            DeliveryOutcome::Delivered { response_status } => sqlx::query_as::<
                _,
                WebhookDeliveryRow,
            >(&format!(
                "UPDATE webhook_deliveries
                SET attempt_count = attempt_count + 1,
                    delivered_at = $3,
                    last_error = NULL,
                    response_status = $4,
                    next_attempt_at = NULL,
                    claim_token = NULL,
                    claimed_until = NULL,
                    updated_at = $3
                WHERE id = $1
                  AND claim_token = $2
                  AND delivered_at IS NULL
                  AND skipped_at IS NULL
                RETURNING {DELIVERY_COLUMNS}"
            ))
            .bind(delivery_id)
            .bind(claim_token)
            .bind(now)
            .bind(*response_status)
            .fetch_optional(&mut *conn)
            .await,
            DeliveryOutcome::Failed {
                response_status,
                error,
                next_attempt_at,
            } => sqlx::query_as::<_, WebhookDeliveryRow>(&format!(
                "UPDATE webhook_deliveries
                SET attempt_count = attempt_count + 1,
                    last_error = $4,
                    response_status = $5,
                    next_attempt_at = $6,
                    claim_token = NULL,
                    claimed_until = NULL,
                    updated_at = $3
                WHERE id = $1
                  AND claim_token = $2
                  AND delivered_at IS NULL
                  AND skipped_at IS NULL
                RETURNING {DELIVERY_COLUMNS}"
            ))
            .bind(delivery_id)
            .bind(claim_token)
            .bind(now)
            .bind(error)
            .bind(*response_status)
            .bind(*next_attempt_at)
            .fetch_optional(&mut *conn)
            .await,
            DeliveryOutcome::Skipped { reason } => sqlx::query_as::<_, WebhookDeliveryRow>(
                &format!(
                    "UPDATE webhook_deliveries
                    SET skipped_at = $3,
                        last_error = $4,
                        next_attempt_at = NULL,
                        claim_token = NULL,
                        claimed_until = NULL,
                        updated_at = $3
                    WHERE id = $1
                      AND claim_token = $2
                      AND delivered_at IS NULL
                      AND skipped_at IS NULL
                    RETURNING {DELIVERY_COLUMNS}"
                ),
            )
            .bind(delivery_id)
            .bind(claim_token)
            .bind(now)
            .bind(reason)
            .fetch_optional(&mut *conn)
            .await,
        };

        query.map_err(|_| WebhookDeliveryRepositoryError::StorageUnavailable)
    }

    async fn list_by_webhook_impl_conn(
        conn: &mut PgConnection,
        webhook_id: uuid::Uuid,
        salon_id: uuid::Uuid,
        limit: u32,
    ) -> Result<Vec<WebhookDeliveryRow>, WebhookDeliveryRepositoryError> {
        let rows = sqlx::query_as::<_, WebhookDeliveryRow>(&format!(
            "SELECT {DELIVERY_COLUMNS}
            FROM webhook_deliveries
            WHERE webhook_id = $1
              AND salon_id = $2
            ORDER BY created_at DESC, id DESC
            LIMIT $3"
        ))
        .bind(webhook_id)
        .bind(salon_id)
        .bind(i64::from(limit))
        .fetch_all(&mut *conn)
        .await
        .map_err(|_| WebhookDeliveryRepositoryError::StorageUnavailable)?;

        Ok(rows)
    }

    async fn stats_impl_conn(
        conn: &mut PgConnection,
        salon_id: uuid::Uuid,
        max_attempts: u32,
        day_start: OffsetDateTime,
    ) -> Result<WebhookDeliveryStats, WebhookDeliveryRepositoryError> {
        let stats = sqlx::query_as::<_, WebhookDeliveryStats>(
            "SELECT
                COUNT(*) FILTER (
                    WHERE delivered_at IS NULL AND skipped_at IS NULL AND attempt_count < $2
                ) AS pending,
                COUNT(*) FILTER (WHERE delivered_at IS NOT NULL) AS delivered,
                COUNT(*) FILTER (
                    WHERE delivered_at IS NULL AND skipped_at IS NULL AND attempt_count >= $2
                ) AS failed,
                COUNT(*) FILTER (
                    WHERE delivered_at IS NULL AND skipped_at IS NOT NULL
                ) AS skipped,
                COUNT(*) FILTER (WHERE delivered_at >= $3) AS delivered_today
            FROM webhook_deliveries
            WHERE salon_id = $1",
        )
        .bind(salon_id)
        .bind(i32::try_from(max_attempts).unwrap_or(i32::MAX))
        .bind(day_start)
        .fetch_one(&mut *conn)
        .await
        .map_err(|_| WebhookDeliveryRepositoryError::StorageUnavailable)?;

        Ok(stats)
    }
}

#[async_trait]
impl WebhookDeliveryStore for WebhookDeliveryStorePostgres {
    async fn get(
        &self,
        delivery_id: uuid::Uuid,
    ) -> Result<Option<WebhookDeliveryRow>, WebhookDeliveryRepositoryError> {
        self.db
            .with_conn(move |conn| Box::pin(Self::get_impl_conn(conn, delivery_id)))
            .await
    }

    async fn insert_batch(
        &self,
        rows: &[WebhookDeliveryRow],
    ) -> Result<Vec<WebhookDeliveryRow>, WebhookDeliveryRepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let rows = rows.to_vec();
        self.db
            .with_tx(move |tx| {
                Box::pin(async move {
                    let mut stored = Vec::with_capacity(rows.len());
                    for row in &rows {
                        stored.push(Self::insert_impl_conn(&mut **tx, row).await?);
                    }
                    Ok(stored)
                })
            })
            .await
    }

    async fn claim_batch(
        &self,
        claim: ClaimBatch,
    ) -> Result<Vec<WebhookDeliveryRow>, WebhookDeliveryRepositoryError> {
        if claim.limit == 0 {
            return Ok(Vec::new());
        }
        self.db
            .with_conn(move |conn| Box::pin(Self::claim_batch_impl_conn(conn, claim)))
            .await
    }

    async fn record_outcome(
        &self,
        delivery_id: uuid::Uuid,
        claim_token: uuid::Uuid,
        now: OffsetDateTime,
        outcome: &DeliveryOutcome,
    ) -> Result<Option<WebhookDeliveryRow>, WebhookDeliveryRepositoryError> {
        let outcome = outcome.clone();
        self.db
            .with_conn(move |conn| {
                Box::pin(async move {
                    Self::record_outcome_impl_conn(conn, delivery_id, claim_token, now, &outcome)
                        .await
                })
            })
            .await
    }

    async fn list_by_webhook(
        &self,
        webhook_id: uuid::Uuid,
        salon_id: uuid::Uuid,
        limit: u32,
    ) -> Result<Vec<WebhookDeliveryRow>, WebhookDeliveryRepositoryError> {
        self.db
            .with_conn(move |conn| {
                Box::pin(Self::list_by_webhook_impl_conn(
                    conn, webhook_id, salon_id, limit,
                ))
            })
            .await
    }

    async fn stats(
        &self,
        salon_id: uuid::Uuid,
        max_attempts: u32,
        day_start: OffsetDateTime,
    ) -> Result<WebhookDeliveryStats, WebhookDeliveryRepositoryError> {
        self.db
            .with_conn(move |conn| {
                Box::pin(Self::stats_impl_conn(
                    conn,
                    salon_id,
                    max_attempts,
                    day_start,
                ))
            })
            .await
    }
}
