//! Outbound HTTP transport for signed webhook calls.

use crate::domain::services::signature::{
    self, DELIVERY_ID_HEADER, EVENT_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

const MAX_ERROR_LEN: usize = 512;

#[derive(Debug, Clone)]
pub struct WebhookClientConfig {
    /// Upper bound for one HTTP attempt, connect included.
    pub timeout: Duration,
    pub user_agent: String,
}

impl WebhookClientConfig {
    pub fn from_settings(settings: &crate::config::Delivery) -> Self {
        Self {
            timeout: Duration::from_millis(settings.request_timeout_ms),
            user_agent: settings.user_agent.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), WebhookClientError> {
        if self.timeout.is_zero() {
            return Err(WebhookClientError::Config(
                "timeout cannot be zero".to_string(),
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(WebhookClientError::Config(
                "user_agent cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum WebhookClientError {
    #[error("invalid webhook client config: {0}")]
    Config(String),
    #[error("http client build failed: {0}")]
    Build(String),
}

/// One outbound call. The body goes out unchanged.
#[derive(Debug, Clone, Copy)]
pub struct OutboundWebhook<'a> {
    pub url: &'a str,
    pub delivery_id: uuid::Uuid,
    pub event_type: &'a str,
    pub secret: &'a str,
    pub body: &'a [u8],
    pub timestamp: i64,
}

/// Result of a single HTTP attempt. Transport problems are values, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryAttempt {
    Delivered { status: u16 },
    Failed { status: Option<u16>, error: String },
}

impl DeliveryAttempt {
    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryAttempt::Delivered { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            DeliveryAttempt::Delivered { status } => Some(*status),
            DeliveryAttempt::Failed { status, .. } => *status,
        }
    }
}

#[async_trait]
pub trait WebhookSender: Send + Sync {
    /// Sign and POST the body. Never fails; every outcome is a `DeliveryAttempt`.
    async fn send(&self, request: OutboundWebhook<'_>) -> DeliveryAttempt;
}

#[derive(Clone, Debug)]
pub struct WebhookClient {
    http: reqwest::Client,
    config: WebhookClientConfig,
}

impl WebhookClient {
    pub fn new(config: WebhookClientConfig) -> Result<Self, WebhookClientError> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| WebhookClientError::Build(e.to_string()))?;

        Ok(Self { http, config })
    }

    fn describe_error(&self, err: &reqwest::Error) -> String {
        let message = if err.is_timeout() {
            format!("request timed out after {}ms", self.config.timeout.as_millis())
        } else if err.is_connect() {
            format!("connection failed: {err}")
        } else {
            err.to_string()
        };
        truncate(message)
    }
}

fn truncate(mut message: String) -> String {
    if message.len() > MAX_ERROR_LEN {
        let mut cut = MAX_ERROR_LEN;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
    }
    message
}

#[async_trait]
impl WebhookSender for WebhookClient {
    async fn send(&self, request: OutboundWebhook<'_>) -> DeliveryAttempt {
        let started_at = Instant::now();
        let signature = signature::sign(request.secret, request.timestamp, request.body);

        let result = self
            .http
            .post(request.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(DELIVERY_ID_HEADER, request.delivery_id.to_string())
            .header(EVENT_HEADER, request.event_type)
            .header(TIMESTAMP_HEADER, request.timestamp.to_string())
            .header(SIGNATURE_HEADER, signature)
            .body(request.body.to_vec())
            .send()
            .await;
        let elapsed_ms = started_at.elapsed().as_millis() as u64;

        match result {
            Ok(response) => {
                let status = response.status();
                debug!(
                    delivery_id = %request.delivery_id,
                    status = status.as_u16(),
                    elapsed_ms,
                    "webhook_http_response"
                );
                if status.is_success() {
                    DeliveryAttempt::Delivered {
                        status: status.as_u16(),
                    }
                } else {
                    DeliveryAttempt::Failed {
                        status: Some(status.as_u16()),
                        error: format!("HTTP {}", status.as_u16()),
                    }
                }
            }
            Err(err) => {
                let error = self.describe_error(&err);
                warn!(
                    delivery_id = %request.delivery_id,
                    error = %error,
                    elapsed_ms,
                    "webhook_http_error"
                );
                DeliveryAttempt::Failed {
                    status: None,
                    error,
                }
            }
        }
    }
}
