use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::application::context::AppContext;

#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<AppContext>,
    /// `None` when metrics are disabled; `/metrics` then answers 503.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(ctx: Arc<AppContext>, metrics: Option<PrometheusHandle>) -> Self {
        Self { ctx, metrics }
    }
}
