use crate::interface::http::state::AppState;
use axum::extract::State;
use axum::{Json, Router, routing::get};
use serde::Serialize;

/// Liveness body. Says nothing about storage; `/ready` covers that.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: String,
    version: &'static str,
}

/// Builds the liveness route.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: state.ctx.settings.observability.service_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::router;
    use crate::application::context::test_support::test_context;
    use crate::interface::http::state::AppState;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::util::ServiceExt;

    #[tokio::test]
    async fn given_storage_down_when_health_should_still_report_service() {
        let mut ctx = test_context();
        ctx.settings.observability.service_name = "salon-hooks-eu".to_string();
        let state = AppState::new(Arc::new(ctx), None);

        let response = router()
            .with_state(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "salon-hooks-eu");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }
}
