use std::sync::Arc;

use crate::infrastructure::db::database::{Database, DatabaseError};
use crate::infrastructure::db::postgres::PostgresDatabase;
use crate::infrastructure::db::postgres::webhook_delivery_store_postgres::WebhookDeliveryStorePostgres;
use crate::infrastructure::db::postgres::webhook_store_postgres::WebhookStorePostgres;
use crate::infrastructure::db::repositories::webhook_delivery_repository::WebhookDeliveryRepository;
use crate::infrastructure::db::repositories::webhook_repository::WebhookRepository;
use crate::infrastructure::db::stores::webhook_delivery_store::{
    DisabledWebhookDeliveryStore, WebhookDeliveryStore,
};
use crate::infrastructure::db::stores::webhook_store::{DisabledWebhookStore, WebhookStore};

#[derive(Clone)]
pub struct Repositories {
    pub db: Option<Arc<dyn Database>>,
    pub webhook: Arc<WebhookRepository>,
    pub delivery: Arc<WebhookDeliveryRepository>,
}

impl Repositories {
    /// Build all repositories backed by Postgres stores.
    pub fn postgres(db: Arc<PostgresDatabase>) -> Self {
        let webhook_store = Arc::new(WebhookStorePostgres::new(db.clone()));
        let delivery_store = Arc::new(WebhookDeliveryStorePostgres::new(db.clone()));

        Self {
            db: Some(db as Arc<dyn Database>),
            webhook: Arc::new(WebhookRepository::new(webhook_store)),
            delivery: Arc::new(WebhookDeliveryRepository::new(delivery_store)),
        }
    }

    /// Build repositories over arbitrary stores, without a database handle.
    pub fn from_stores(
        webhook_store: Arc<dyn WebhookStore>,
        delivery_store: Arc<dyn WebhookDeliveryStore>,
    ) -> Self {
        Self {
            db: None,
            webhook: Arc::new(WebhookRepository::new(webhook_store)),
            delivery: Arc::new(WebhookDeliveryRepository::new(delivery_store)),
        }
    }

    /// Repositories that report storage as unavailable for every call.
    pub fn disabled() -> Self {
        Self::from_stores(
            Arc::new(DisabledWebhookStore),
            Arc::new(DisabledWebhookDeliveryStore),
        )
    }

    /// Check that the backing database answers.
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        let Some(db) = self.db.as_ref() else {
            return Err(DatabaseError::Connection("db_unavailable".to_string()));
        };
        db.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::Repositories;
    use crate::domain::value_objects::ids::SalonId;
    use crate::infrastructure::db::database::DatabaseError;
    use crate::infrastructure::db::stores::webhook_store::WebhookRepositoryError;

    #[tokio::test]
    async fn given_disabled_repositories_when_ping_should_fail() {
        let repos = Repositories::disabled();

        let err = repos.ping().await.unwrap_err();

        assert!(matches!(err, DatabaseError::Connection(_)));
    }

    #[tokio::test]
    async fn given_disabled_repositories_when_listing_should_report_storage_unavailable() {
        let repos = Repositories::disabled();

        let err = repos.webhook.list_by_salon(SalonId::new()).await.unwrap_err();

        assert_eq!(err, WebhookRepositoryError::StorageUnavailable);
    }
}
