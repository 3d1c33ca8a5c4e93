// HTTP routes: trigger-token protected endpoints for the scheduler and producers.

use crate::application::usecases::enqueue_event::{
    EnqueueEventCommand, EnqueueEventError, EnqueueEventUseCase,
};
use crate::application::usecases::process_deliveries::{
    ProcessDeliveriesError, ProcessDeliveriesUseCase, WorkerConfig,
};
use crate::domain::value_objects::ids::SalonId;
use crate::interface::http::dto::delivery::{
    EnqueueEventRequest, EnqueueEventResponse, ProcessDeliveriesResponse, ProcessQuery,
};
use crate::interface::http::problem::{
    WH_INTERNAL, WH_REQUEST_MALFORMED, WH_STORAGE_UNAVAILABLE, WH_VALIDATION_FAILED, problem,
};
use crate::interface::http::state::AppState;
use crate::interface::http::trace::TraceId;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json};
use tracing::{error, info};

/// Builds the internal routes. The caller layers trigger auth on top.
pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(
            "/internal/webhook-deliveries/process",
            get(process_deliveries).post(process_deliveries),
        )
        .route("/internal/events", post(enqueue_event))
}

fn malformed(detail: String, uri: &Uri, trace_id: Option<String>) -> Response {
    problem(
        StatusCode::BAD_REQUEST,
        WH_REQUEST_MALFORMED,
        Some(detail),
        Some(uri.path().to_string()),
        trace_id,
    )
}

fn storage_unavailable(uri: &Uri, trace_id: Option<String>) -> Response {
    problem(
        StatusCode::SERVICE_UNAVAILABLE,
        WH_STORAGE_UNAVAILABLE,
        Some("storage unavailable".to_string()),
        Some(uri.path().to_string()),
        trace_id,
    )
}

/// Runs one delivery batch. Per-delivery failures still answer 200 with counts.
async fn process_deliveries(
    State(state): State<AppState>,
    trace: Option<Extension<TraceId>>,
    uri: Uri,
    query: Result<Query<ProcessQuery>, QueryRejection>,
) -> Response {
    let trace_id = trace.map(|Extension(t)| t.0);

    // Step 1: Resolve the batch size and worker config for this invocation.
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return malformed(rejection.body_text(), &uri, trace_id),
    };
    let delivery = &state.ctx.settings.delivery;
    let batch_size = delivery.effective_batch_size(query.batch_size);
    let config = WorkerConfig::from_settings(delivery, batch_size);

    // Step 2: Run the batch.
    let result = ProcessDeliveriesUseCase::execute(&state.ctx, &config, batch_size).await;

    // Step 3: Map output to HTTP response.
    match result {
        Ok(out) => Json(ProcessDeliveriesResponse::from(out)).into_response(),
        Err(ProcessDeliveriesError::Storage(cause)) => {
            error!(
                trace_id = trace_id.as_deref().unwrap_or(""),
                error = %cause,
                "delivery batch aborted"
            );
            storage_unavailable(&uri, trace_id)
        }
    }
}

/// Enqueues one event for every active subscriber of the salon.
async fn enqueue_event(
    State(state): State<AppState>,
    trace: Option<Extension<TraceId>>,
    uri: Uri,
    payload: Result<Json<EnqueueEventRequest>, JsonRejection>,
) -> Response {
    let trace_id = trace.map(|Extension(t)| t.0);

    // Step 1: Decode the body.
    let Json(payload) = match payload {
        Ok(body) => body,
        Err(rejection) => return malformed(rejection.body_text(), &uri, trace_id),
    };
    let Some(salon_id) = SalonId::parse(&payload.salon_id) else {
        return malformed("invalid salon_id".to_string(), &uri, trace_id);
    };
    let body = match serde_json::to_vec(&payload.payload) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, "event payload encoding failed");
            return problem(
                StatusCode::INTERNAL_SERVER_ERROR,
                WH_INTERNAL,
                Some("internal error".to_string()),
                Some(uri.path().to_string()),
                trace_id,
            );
        }
    };

    // Step 2: Execute the use case.
    let result = EnqueueEventUseCase::execute(
        &state.ctx,
        EnqueueEventCommand {
            salon_id,
            event_type: payload.event_type,
            payload: body,
        },
    )
    .await;

    // Step 3: Map output to HTTP response.
    match result {
        Ok(out) => {
            info!(salon_id = %salon_id, enqueued = out.enqueued, "event accepted");
            (StatusCode::ACCEPTED, Json(EnqueueEventResponse::from(out))).into_response()
        }
        Err(EnqueueEventError::Validation(detail)) => problem(
            StatusCode::UNPROCESSABLE_ENTITY,
            WH_VALIDATION_FAILED,
            Some(detail),
            Some(uri.path().to_string()),
            trace_id,
        ),
        Err(EnqueueEventError::Storage(cause)) => {
            error!(error = %cause, "event enqueue failed");
            storage_unavailable(&uri, trace_id)
        }
    }
}
