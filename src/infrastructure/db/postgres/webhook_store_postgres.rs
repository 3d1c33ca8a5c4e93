use crate::infrastructure::db::dto::WebhookRow;
use crate::infrastructure::db::postgres::PostgresDatabase;
use crate::infrastructure::db::stores::webhook_store::{WebhookRepositoryError, WebhookStore};
use async_trait::async_trait;
use sqlx::PgConnection;
use time::OffsetDateTime;

const WEBHOOK_COLUMNS: &str = "id, salon_id, name, url, events, secret, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct WebhookStorePostgres {
    db: std::sync::Arc<PostgresDatabase>,
}

impl WebhookStorePostgres {
    /// Build a Postgres-backed webhook store.
    pub fn new(db: std::sync::Arc<PostgresDatabase>) -> Self {
        Self { db }
    }

    async fn get_impl_conn(
        conn: &mut PgConnection,
        webhook_id: uuid::Uuid,
    ) -> Result<Option<WebhookRow>, WebhookRepositoryError> {
        let row = sqlx::query_as::<_, WebhookRow>(&format!(
            "SELECT {WEBHOOK_COLUMNS} FROM webhooks WHERE id = $1"
        ))
        .bind(webhook_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|_| WebhookRepositoryError::StorageUnavailable)?;

        Ok(row)
    }

    async fn list_by_salon_impl_conn(
        conn: &mut PgConnection,
        salon_id: uuid::Uuid,
    ) -> Result<Vec<WebhookRow>, WebhookRepositoryError> {
        let rows = sqlx::query_as::<_, WebhookRow>(&format!(
            "SELECT {WEBHOOK_COLUMNS}
            FROM webhooks
            WHERE salon_id = $1
            ORDER BY created_at ASC, id ASC"
        ))
        .bind(salon_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|_| WebhookRepositoryError::StorageUnavailable)?;

        Ok(rows)
    }

    async fn list_subscribed_impl_conn(
        conn: &mut PgConnection,
        salon_id: uuid::Uuid,
        event_type: &str,
    ) -> Result<Vec<WebhookRow>, WebhookRepositoryError> {
        let rows = sqlx::query_as::<_, WebhookRow>(&format!(
            "SELECT {WEBHOOK_COLUMNS}
            FROM webhooks
            WHERE salon_id = $1
              AND is_active = true
              AND $2 = ANY(events)
            ORDER BY created_at ASC, id ASC"
        ))
        .bind(salon_id)
        .bind(event_type)
        .fetch_all(&mut *conn)
        .await
        .map_err(|_| WebhookRepositoryError::StorageUnavailable)?;

        Ok(rows)
    }

    async fn insert_impl_conn(
        conn: &mut PgConnection,
        row: &WebhookRow,
    ) -> Result<WebhookRow, WebhookRepositoryError> {
        let stored = sqlx::query_as::<_, WebhookRow>(&format!(
            "INSERT INTO webhooks ({WEBHOOK_COLUMNS})
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
            ON CONFLICT DO NOTHING
            RETURNING {WEBHOOK_COLUMNS}"
        ))
        .bind(row.id)
        .bind(row.salon_id)
        .bind(&row.name)
        .bind(&row.url)
        .bind(&row.events)
        .bind(&row.secret)
        .bind(row.is_active)
        .bind(row.created_at)
        .bind(row.updated_at)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|_| WebhookRepositoryError::StorageUnavailable)?;

        match stored {
            Some(row) => Ok(row),
            None => Err(WebhookRepositoryError::Conflict),
        }
    }

    async fn set_active_impl_conn(
        conn: &mut PgConnection,
        webhook_id: uuid::Uuid,
        salon_id: uuid::Uuid,
        is_active: bool,
        now: OffsetDateTime,
    ) -> Result<WebhookRow, WebhookRepositoryError> {
        let stored = sqlx::query_as::<_, WebhookRow>(&format!(
            "UPDATE webhooks
            SET is_active = $3,
                updated_at = $4
            WHERE id = $1
              AND salon_id = $2
            RETURNING {WEBHOOK_COLUMNS}"
        ))
        .bind(webhook_id)
        .bind(salon_id)
        .bind(is_active)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|_| WebhookRepositoryError::StorageUnavailable)?;

        stored.ok_or(WebhookRepositoryError::NotFound)
    }

    async fn delete_impl_conn(
        conn: &mut PgConnection,
        webhook_id: uuid::Uuid,
        salon_id: uuid::Uuid,
    ) -> Result<(), WebhookRepositoryError> {
        let result = sqlx::query("DELETE FROM webhooks WHERE id = $1 AND salon_id = $2")
            .bind(webhook_id)
            .bind(salon_id)
            .execute(&mut *conn)
            .await
            .map_err(|_| WebhookRepositoryError::StorageUnavailable)?;

        if result.rows_affected() == 0 {
            return Err(WebhookRepositoryError::NotFound);
        }

        Ok(())
    }
}

#[async_trait]
impl WebhookStore for WebhookStorePostgres {
    async fn get(
        &self,
        webhook_id: uuid::Uuid,
    ) -> Result<Option<WebhookRow>, WebhookRepositoryError> {
        self.db
            .with_conn(move |conn| Box::pin(Self::get_impl_conn(conn, webhook_id)))
            .await
    }

    async fn list_by_salon(
        &self,
        salon_id: uuid::Uuid,
    ) -> Result<Vec<WebhookRow>, WebhookRepositoryError> {
        self.db
            .with_conn(move |conn| Box::pin(Self::list_by_salon_impl_conn(conn, salon_id)))
            .await
    }

    async fn list_subscribed(
        &self,
        salon_id: uuid::Uuid,
        event_type: &str,
    ) -> Result<Vec<WebhookRow>, WebhookRepositoryError> {
        let event_type = event_type.to_string();
        self.db
            .with_conn(move |conn| {
                Box::pin(async move {
                    Self::list_subscribed_impl_conn(conn, salon_id, &event_type).await
                })
            })
            .await
    }

    async fn insert(&self, row: &WebhookRow) -> Result<WebhookRow, WebhookRepositoryError> {
        let row = row.clone();
        self.db
            .with_conn(move |conn| {
                let row = row;
                Box::pin(async move { Self::insert_impl_conn(conn, &row).await })
            })
            .await
    }

    async fn set_active(
        &self,
        webhook_id: uuid::Uuid,
        salon_id: uuid::Uuid,
        is_active: bool,
        now: OffsetDateTime,
    ) -> Result<WebhookRow, WebhookRepositoryError> {
        self.db
            .with_conn(move |conn| {
                Box::pin(Self::set_active_impl_conn(
                    conn, webhook_id, salon_id, is_active, now,
                ))
            })
            .await
    }

    async fn delete(
        &self,
        webhook_id: uuid::Uuid,
        salon_id: uuid::Uuid,
    ) -> Result<(), WebhookRepositoryError> {
        self.db
            .with_conn(move |conn| Box::pin(Self::delete_impl_conn(conn, webhook_id, salon_id)))
            .await
    }
}
