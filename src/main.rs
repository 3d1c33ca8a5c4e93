use salon_hooks::application::context::AppContext;
use salon_hooks::config;
use salon_hooks::infrastructure::db::postgres::PostgresDatabase;
use salon_hooks::infrastructure::db::repositories::Repositories;
use salon_hooks::infrastructure::outbound::webhook_client::{WebhookClient, WebhookClientConfig};
use salon_hooks::interface::http;
use salon_hooks::interface::http::state::AppState;
use salon_hooks::observability;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    // Step 1: Load configuration.
    let settings = config::load().expect("load config");

    // Step 2: Initialise logging and the metrics recorder.
    observability::init_tracing(&settings.observability).expect("init tracing");
    let metrics = observability::init_metrics(&settings.observability).expect("init metrics");
    if settings.delivery.trigger_token.is_empty() {
        warn!("delivery.trigger_token is empty; internal endpoints will reject every call");
    }

    // Step 3: Connect to the database.
    let db = Arc::new(
        PostgresDatabase::connect_with(&settings.db)
            .await
            .expect("connect database"),
    );

    // Step 4: Build repositories and the outbound webhook client.
    let repos = Repositories::postgres(db);
    let client = WebhookClient::new(WebhookClientConfig::from_settings(&settings.delivery))
        .expect("build webhook client");

    // Step 5: Assemble shared application context and HTTP state.
    let bind_addr = format!("{}:{}", settings.server.host, settings.server.port);
    let ctx = AppContext::new(repos, Arc::new(client), settings);
    let state = AppState::new(Arc::new(ctx), metrics);

    // Step 6: Bind and serve.
    let app = http::app(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("bind server");
    info!(addr = %bind_addr, "salon-hooks listening");

    axum::serve(listener, app).await.expect("serve");
}
