use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: Server,
    pub db: Db,
    pub auth: Auth,
    pub delivery: Delivery,
    pub observability: Observability,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Db {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_ms: u64,
}

/// Session token verification for the admin surface.
#[derive(Debug, Deserialize, Clone)]
pub struct Auth {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Delivery {
    /// Shared secret presented by the external scheduler. Empty disables the trigger.
    pub trigger_token: String,
    pub batch_size: u32,
    pub max_batch_size: u32,
    pub max_attempts: u32,
    pub request_timeout_ms: u64,
    pub concurrency: usize,
    pub claim_lease_seconds: i64,
    pub backoff_initial_ms: u64,
    pub backoff_max_ms: u64,
    pub user_agent: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Observability {
    pub service_name: String,
    /// `pretty` or `json`.
    pub log_format: String,
    pub enable_metrics: bool,
}

impl Delivery {
    /// Clamp a caller-supplied batch size into `1..=max_batch_size`.
    pub fn effective_batch_size(&self, requested: Option<u32>) -> u32 {
        let upper = self.max_batch_size.max(1);
        requested.unwrap_or(self.batch_size).clamp(1, upper)
    }
}

/// Load settings from `config/default.toml`, `config/<env>.toml`, and env overrides.
pub fn load() -> Result<Settings, config::ConfigError> {
    let env_name = std::env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());
    config::Config::builder()
        .add_source(config::File::with_name("config/default"))
        .add_source(config::File::with_name(&format!("config/{env_name}")).required(false))
        .add_source(config::Environment::with_prefix("SALON_HOOKS").separator("__"))
        .build()?
        .try_deserialize()
}
