use crate::interface::http::state::AppState;
use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Serialize)]
struct ReadyResponse {
    status: &'static str,
}

/// Builds the readiness route.
pub fn router() -> Router<AppState> {
    Router::new().route("/ready", get(ready))
}

async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    match state.ctx.repos.ping().await {
        Ok(()) => (StatusCode::OK, Json(ReadyResponse { status: "ready" })),
        Err(e) => {
            warn!(error = %e, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyResponse {
                    status: "not_ready",
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::router;
    use crate::application::context::test_support::test_context;
    use crate::interface::http::state::AppState;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::util::ServiceExt;

    #[tokio::test]
    async fn given_no_database_when_ready_should_return_unavailable() {
        let state = AppState::new(Arc::new(test_context()), None);

        let response = router()
            .with_state(state)
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
