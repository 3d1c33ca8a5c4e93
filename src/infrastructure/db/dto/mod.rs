pub mod webhook;
pub mod webhook_delivery;

pub use webhook::WebhookRow;
pub use webhook_delivery::{ClaimBatch, DeliveryOutcome, WebhookDeliveryRow, WebhookDeliveryStats};
