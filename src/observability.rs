use crate::config::Observability;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Error)]
pub enum ObservabilityError {
    #[error("invalid log filter: {0}")]
    Filter(String),
    #[error("tracing init failed: {0}")]
    Tracing(String),
    #[error("metrics recorder install failed: {0}")]
    Metrics(String),
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the `info` default.
pub fn init_tracing(settings: &Observability) -> Result<(), ObservabilityError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| ObservabilityError::Filter(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if settings.log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };
    result.map_err(|e| ObservabilityError::Tracing(e.to_string()))
}

/// Install the Prometheus recorder when metrics are enabled.
pub fn init_metrics(
    settings: &Observability,
) -> Result<Option<PrometheusHandle>, ObservabilityError> {
    if !settings.enable_metrics {
        return Ok(None);
    }
    let handle = PrometheusBuilder::new()
        .add_global_label("service", settings.service_name.clone())
        .install_recorder()
        .map_err(|e| ObservabilityError::Metrics(e.to_string()))?;
    Ok(Some(handle))
}
