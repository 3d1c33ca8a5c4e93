mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use salon_hooks::application::context::AppContext;
use salon_hooks::domain::entities::delivery::Delivery;
use salon_hooks::domain::entities::webhook::Webhook;
use salon_hooks::domain::value_objects::event_type::EventType;
use salon_hooks::domain::value_objects::ids::SalonId;
use salon_hooks::domain::value_objects::secret::SigningSecret;
use salon_hooks::domain::value_objects::timestamps::Timestamp;
use salon_hooks::infrastructure::db::dto::{ClaimBatch, DeliveryOutcome};
use salon_hooks::infrastructure::db::postgres::PostgresDatabase;
use salon_hooks::infrastructure::db::repositories::Repositories;
use salon_hooks::infrastructure::outbound::webhook_client::{WebhookClient, WebhookClientConfig};
use salon_hooks::interface::http;
use salon_hooks::interface::http::state::AppState;
use std::collections::HashSet;
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use tower::util::ServiceExt;

fn test_db_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok()
}

async fn setup() -> Option<(Repositories, Arc<PostgresDatabase>)> {
    let url = test_db_url()?;
    let db = Arc::new(PostgresDatabase::connect(&url).await.ok()?);
    sqlx::raw_sql(include_str!("../migrations/0001_webhooks.sql"))
        .execute(db.pool())
        .await
        .ok()?;
    Some((Repositories::postgres(db.clone()), db))
}

fn webhook(salon_id: SalonId) -> Webhook {
    Webhook::new(
        salon_id,
        "CRM".to_string(),
        "https://example.com/hook".to_string(),
        EventType::defaults(),
        SigningSecret::generate(),
    )
}

fn claim(limit: u32, max_attempts: u32) -> ClaimBatch {
    let now = OffsetDateTime::now_utc();
    ClaimBatch {
        claim_token: uuid::Uuid::new_v4(),
        now,
        claimed_until: now + Duration::seconds(60),
        max_attempts,
        limit,
    }
}

#[tokio::test]
async fn concurrent_claims_never_share_a_row() {
    let Some((repos, _db)) = setup().await else {
        return;
    };
    let salon = SalonId::new();
    let hook = repos.webhook.insert(&webhook(salon)).await.unwrap();
    let event = EventType::parse("booking.created").unwrap();
    let deliveries: Vec<Delivery> = (0..8)
        .map(|n| Delivery::enqueue(&hook, event.clone(), format!("{{\"n\":{n}}}").into_bytes()))
        .collect();
    repos.delivery.enqueue_all(&deliveries).await.unwrap();
    let ours: HashSet<_> = deliveries.iter().map(|d| d.id).collect();

    let (first, second) = tokio::join!(
        repos.delivery.claim(claim(100, 5)),
        repos.delivery.claim(claim(100, 5))
    );

    let first: HashSet<_> = first.unwrap().into_iter().map(|d| d.id).filter(|id| ours.contains(id)).collect();
    let second: HashSet<_> = second.unwrap().into_iter().map(|d| d.id).filter(|id| ours.contains(id)).collect();
    assert!(first.is_disjoint(&second));
    assert_eq!(first.len() + second.len(), 8);
}

#[tokio::test]
async fn outcome_requires_the_current_claim_token() {
    let Some((repos, _db)) = setup().await else {
        return;
    };
    let salon = SalonId::new();
    let hook = repos.webhook.insert(&webhook(salon)).await.unwrap();
    let delivery = Delivery::enqueue(&hook, EventType::parse("booking.updated").unwrap(), b"{}".to_vec());
    repos.delivery.enqueue_all(std::slice::from_ref(&delivery)).await.unwrap();
    let batch = claim(1_000, 5);
    let token = batch.claim_token;
    let claimed = repos.delivery.claim(batch).await.unwrap();
    assert!(claimed.iter().any(|d| d.id == delivery.id));

    let stale = repos
        .delivery
        .record(
            delivery.id,
            uuid::Uuid::new_v4(),
            Timestamp::now_utc(),
            &DeliveryOutcome::Delivered { response_status: 200 },
        )
        .await
        .unwrap();
    assert!(stale.is_none());

    let recorded = repos
        .delivery
        .record(
            delivery.id,
            token,
            Timestamp::now_utc(),
            &DeliveryOutcome::Delivered { response_status: 204 },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(recorded.attempt_count, 1);
    assert!(recorded.delivered_at.is_some());

    let again = repos
        .delivery
        .record(
            delivery.id,
            token,
            Timestamp::now_utc(),
            &DeliveryOutcome::Delivered { response_status: 200 },
        )
        .await
        .unwrap();
    assert!(again.is_none());

    let stats = repos
        .delivery
        .stats(salon, 5, Timestamp::now_utc().start_of_day())
        .await
        .unwrap();
    assert_eq!(stats.delivered, 1);
    assert_eq!(stats.delivered_today, 1);
    assert_eq!(stats.pending, 0);
}

#[tokio::test]
async fn exhausted_rows_are_not_claimed() {
    let Some((repos, _db)) = setup().await else {
        return;
    };
    let salon = SalonId::new();
    let hook = repos.webhook.insert(&webhook(salon)).await.unwrap();
    let delivery = Delivery::enqueue(&hook, EventType::parse("booking.cancelled").unwrap(), b"{}".to_vec());
    repos.delivery.enqueue_all(std::slice::from_ref(&delivery)).await.unwrap();

    let batch = claim(1_000, 1);
    let token = batch.claim_token;
    repos.delivery.claim(batch).await.unwrap();
    repos
        .delivery
        .record(
            delivery.id,
            token,
            Timestamp::now_utc(),
            &DeliveryOutcome::Failed {
                response_status: Some(500),
                error: "HTTP 500".to_string(),
                next_attempt_at: None,
            },
        )
        .await
        .unwrap();

    let reclaimed = repos.delivery.claim(claim(1_000, 1)).await.unwrap();
    assert!(reclaimed.iter().all(|d| d.id != delivery.id));
    let stored = repos.delivery.get(delivery.id).await.unwrap().unwrap();
    assert_eq!(stored.attempt_count, 1);
    assert_eq!(stored.last_error.as_deref(), Some("HTTP 500"));
}

#[tokio::test]
async fn inactive_webhooks_are_not_subscribed() {
    let Some((repos, _db)) = setup().await else {
        return;
    };
    let salon = SalonId::new();
    let hook = repos.webhook.insert(&webhook(salon)).await.unwrap();
    let event = EventType::parse("booking.created").unwrap();
    assert_eq!(repos.webhook.list_subscribed(salon, &event).await.unwrap().len(), 1);

    let summary = repos.webhook.set_active(hook.id, salon, false).await.unwrap();

    assert!(!summary.is_active);
    assert!(repos.webhook.list_subscribed(salon, &event).await.unwrap().is_empty());
    repos.webhook.delete(hook.id, salon).await.unwrap();
    assert!(repos.webhook.get(hook.id).await.unwrap().is_none());
}

#[tokio::test]
async fn ready_reports_database_reachable() {
    let Some((repos, _db)) = setup().await else {
        return;
    };
    let settings = common::settings();
    let client = WebhookClient::new(WebhookClientConfig::from_settings(&settings.delivery)).unwrap();
    let ctx = AppContext::new(repos, Arc::new(client), settings);
    let state = AppState::new(Arc::new(ctx), None);

    let response = http::app(state)
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
