#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::routing::post;
use jsonwebtoken::{EncodingKey, Header, encode};
use salon_hooks::application::context::AppContext;
use salon_hooks::config::{Auth, Db, Delivery, Observability, Server, Settings};
use salon_hooks::domain::value_objects::ids::SalonId;
use salon_hooks::infrastructure::db::dto::{
    ClaimBatch, DeliveryOutcome, WebhookDeliveryRow, WebhookDeliveryStats, WebhookRow,
};
use salon_hooks::infrastructure::db::repositories::Repositories;
use salon_hooks::infrastructure::db::stores::webhook_delivery_store::{
    WebhookDeliveryRepositoryError, WebhookDeliveryStore,
};
use salon_hooks::infrastructure::db::stores::webhook_store::{
    WebhookRepositoryError, WebhookStore,
};
use salon_hooks::infrastructure::outbound::webhook_client::{WebhookClient, WebhookClientConfig};
use salon_hooks::interface::http;
use salon_hooks::interface::http::auth::{Role, SessionClaims};
use salon_hooks::interface::http::state::AppState;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;

pub const JWT_SECRET: &str = "integration-jwt-secret";
pub const TRIGGER_TOKEN: &str = "integration-trigger-token";

#[derive(Default)]
pub struct MemoryWebhookStore {
    pub rows: Mutex<Vec<WebhookRow>>,
}

#[async_trait]
impl WebhookStore for MemoryWebhookStore {
    async fn get(&self, webhook_id: uuid::Uuid) -> Result<Option<WebhookRow>, WebhookRepositoryError> {
        Ok(self.rows.lock().unwrap().iter().find(|r| r.id == webhook_id).cloned())
    }

    async fn list_by_salon(
        &self,
        salon_id: uuid::Uuid,
    ) -> Result<Vec<WebhookRow>, WebhookRepositoryError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().filter(|r| r.salon_id == salon_id).cloned().collect())
    }

    async fn list_subscribed(
        &self,
        salon_id: uuid::Uuid,
        event_type: &str,
    ) -> Result<Vec<WebhookRow>, WebhookRepositoryError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|r| r.salon_id == salon_id && r.is_active && r.events.iter().any(|e| e == event_type))
            .cloned()
            .collect())
    }

    async fn insert(&self, row: &WebhookRow) -> Result<WebhookRow, WebhookRepositoryError> {
        self.rows.lock().unwrap().push(row.clone());
        Ok(row.clone())
    }

    async fn set_active(
        &self,
        webhook_id: uuid::Uuid,
        salon_id: uuid::Uuid,
        is_active: bool,
        now: OffsetDateTime,
    ) -> Result<WebhookRow, WebhookRepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| r.id == webhook_id && r.salon_id == salon_id)
            .ok_or(WebhookRepositoryError::NotFound)?;
        row.is_active = is_active;
        row.updated_at = now;
        Ok(row.clone())
    }

    async fn delete(&self, webhook_id: uuid::Uuid, salon_id: uuid::Uuid) -> Result<(), WebhookRepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| !(r.id == webhook_id && r.salon_id == salon_id));
        if rows.len() == before {
            return Err(WebhookRepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Claims and outcome writes happen under one lock, mirroring the single SQL statements.
#[derive(Default)]
pub struct MemoryDeliveryStore {
    pub rows: Mutex<Vec<WebhookDeliveryRow>>,
}

impl MemoryDeliveryStore {
    pub fn snapshot(&self) -> Vec<WebhookDeliveryRow> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebhookDeliveryStore for MemoryDeliveryStore {
    async fn get(
        &self,
        delivery_id: uuid::Uuid,
    ) -> Result<Option<WebhookDeliveryRow>, WebhookDeliveryRepositoryError> {
        Ok(self.rows.lock().unwrap().iter().find(|r| r.id == delivery_id).cloned())
    }

    async fn insert_batch(
        &self,
        rows: &[WebhookDeliveryRow],
    ) -> Result<Vec<WebhookDeliveryRow>, WebhookDeliveryRepositoryError> {
        self.rows.lock().unwrap().extend_from_slice(rows);
        Ok(rows.to_vec())
    }

    async fn claim_batch(
        &self,
        claim: ClaimBatch,
    ) -> Result<Vec<WebhookDeliveryRow>, WebhookDeliveryRepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let max_attempts = claim.max_attempts as i32;
        let mut claimed = Vec::new();
        for row in rows.iter_mut() {
            if claimed.len() as u32 >= claim.limit {
                break;
            }
            let claimable = row.delivered_at.is_none()
                && row.skipped_at.is_none()
                && row.attempt_count < max_attempts
                && row.next_attempt_at.is_none_or(|at| at <= claim.now)
                && row.claimed_until.is_none_or(|until| until <= claim.now);
            if claimable {
                row.claim_token = Some(claim.claim_token);
                row.claimed_until = Some(claim.claimed_until);
                claimed.push(row.clone());
            }
        }
        Ok(claimed)
    }

    async fn record_outcome(
        &self,
        delivery_id: uuid::Uuid,
        claim_token: uuid::Uuid,
        now: OffsetDateTime,
        outcome: &DeliveryOutcome,
    ) -> Result<Option<WebhookDeliveryRow>, WebhookDeliveryRepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|r| {
            r.id == delivery_id
                && r.claim_token == Some(claim_token)
                && r.delivered_at.is_none()
                && r.skipped_at.is_none()
        }) else {
            return Ok(None);
        };
        match outcome {
            DeliveryOutcome::Delivered { response_status } => {
                row.attempt_count += 1;
                row.delivered_at = Some(now);
                row.last_error = None;
                row.response_status = Some(*response_status);
                row.next_attempt_at = None;
            }
            DeliveryOutcome::Failed {
                response_status,
                error,
                next_attempt_at,
            } => {
                row.attempt_count += 1;
                row.last_error = Some(error.clone());
                row.response_status = *response_status;
                row.next_attempt_at = *next_attempt_at;
            }
            DeliveryOutcome::Skipped { reason } => {
                row.skipped_at = Some(now);
                row.last_error = Some(reason.clone());
                row.next_attempt_at = None;
            }
        }
        row.claim_token = None;
        row.claimed_until = None;
        row.updated_at = now;
        Ok(Some(row.clone()))
    }

    async fn list_by_webhook(
        &self,
        webhook_id: uuid::Uuid,
        salon_id: uuid::Uuid,
        limit: u32,
    ) -> Result<Vec<WebhookDeliveryRow>, WebhookDeliveryRepositoryError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .rev()
            .filter(|r| r.webhook_id == webhook_id && r.salon_id == salon_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn stats(
        &self,
        salon_id: uuid::Uuid,
        max_attempts: u32,
        day_start: OffsetDateTime,
    ) -> Result<WebhookDeliveryStats, WebhookDeliveryRepositoryError> {
        let rows = self.rows.lock().unwrap();
        let mut stats = WebhookDeliveryStats::default();
        for row in rows.iter().filter(|r| r.salon_id == salon_id) {
            if let Some(at) = row.delivered_at {
                stats.delivered += 1;
                if at >= day_start {
                    stats.delivered_today += 1;
                }
            } else if row.skipped_at.is_some() {
                stats.skipped += 1;
            } else if row.attempt_count >= max_attempts as i32 {
                stats.failed += 1;
            } else {
                stats.pending += 1;
            }
        }
        Ok(stats)
    }
}

pub fn settings() -> Settings {
    Settings {
        server: Server {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        db: Db {
            url: std::env::var("DATABASE_URL").unwrap_or_default(),
            max_connections: 5,
            acquire_timeout_ms: 2_000,
        },
        auth: Auth {
            jwt_secret: JWT_SECRET.to_string(),
        },
        delivery: Delivery {
            trigger_token: TRIGGER_TOKEN.to_string(),
            batch_size: 10,
            max_batch_size: 100,
            max_attempts: 5,
            request_timeout_ms: 1_000,
            concurrency: 4,
            claim_lease_seconds: 60,
            backoff_initial_ms: 0,
            backoff_max_ms: 0,
            user_agent: "salon-hooks/integration".to_string(),
        },
        observability: Observability {
            service_name: "salon-hooks".to_string(),
            log_format: "pretty".to_string(),
            enable_metrics: false,
        },
    }
}

/// An app over in-memory stores and a real outbound client.
pub struct TestApp {
    pub state: AppState,
    pub webhooks: Arc<MemoryWebhookStore>,
    pub deliveries: Arc<MemoryDeliveryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_settings(settings())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let webhooks = Arc::new(MemoryWebhookStore::default());
        let deliveries = Arc::new(MemoryDeliveryStore::default());
        let repos = Repositories::from_stores(webhooks.clone(), deliveries.clone());
        let client = WebhookClient::new(WebhookClientConfig::from_settings(&settings.delivery)).unwrap();
        let ctx = AppContext::new(repos, Arc::new(client), settings);
        Self {
            state: AppState::new(Arc::new(ctx), None),
            webhooks,
            deliveries,
        }
    }

    pub fn router(&self) -> axum::Router {
        http::app(self.state.clone())
    }
}

pub fn session_token(salon_id: SalonId, role: Role) -> String {
    let claims = SessionClaims {
        sub: "user-1".to_string(),
        salon_id: salon_id.0,
        role,
        exp: (OffsetDateTime::now_utc().unix_timestamp() + 3600) as u64,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn response_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}

/// One request seen by a local receiver.
#[derive(Debug, Clone)]
pub struct Received {
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[derive(Clone, Default)]
pub struct Receiver {
    pub statuses: Arc<Mutex<VecDeque<u16>>>,
    pub received: Arc<Mutex<Vec<Received>>>,
}

impl Receiver {
    pub fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }
}

async fn receive(State(receiver): State<Receiver>, headers: HeaderMap, body: axum::body::Bytes) -> StatusCode {
    receiver.received.lock().unwrap().push(Received {
        headers,
        body: body.to_vec(),
    });
    let status = receiver.statuses.lock().unwrap().pop_front().unwrap_or(200);
    StatusCode::from_u16(status).unwrap()
}

/// Start a receiver on `127.0.0.1:0` answering with `statuses` in order, then 200.
pub async fn spawn_receiver(statuses: &[u16]) -> (String, Receiver) {
    let receiver = Receiver {
        statuses: Arc::new(Mutex::new(statuses.iter().copied().collect())),
        received: Arc::new(Mutex::new(Vec::new())),
    };
    let app = axum::Router::new()
        .route("/hook", post(receive))
        .with_state(receiver.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/hook"), receiver)
}
