use std::sync::Arc;

use crate::config::Settings;
use crate::infrastructure::db::repositories::Repositories;
use crate::infrastructure::outbound::webhook_client::WebhookSender;

/// Shared application resources used by use cases.
pub struct AppContext {
    pub repos: Repositories,
    pub sender: Arc<dyn WebhookSender>,
    pub settings: Settings,
}

impl AppContext {
    /// Build a new application context with shared repositories and the outbound sender.
    pub fn new(repos: Repositories, sender: Arc<dyn WebhookSender>, settings: Settings) -> Self {
        Self {
            repos,
            sender,
            settings,
        }
    }
}
