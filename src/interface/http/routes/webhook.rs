// HTTP routes: salon webhook administration.

use crate::application::usecases::create_webhook::{
    CreateWebhookCommand, CreateWebhookError, CreateWebhookUseCase,
};
use crate::application::usecases::delete_webhook::{DeleteWebhookError, DeleteWebhookUseCase};
use crate::application::usecases::delivery_stats::{DeliveryStatsError, DeliveryStatsUseCase};
use crate::application::usecases::list_webhook_deliveries::{
    ListWebhookDeliveriesError, ListWebhookDeliveriesUseCase,
};
use crate::application::usecases::list_webhooks::{ListWebhooksError, ListWebhooksUseCase};
use crate::application::usecases::set_webhook_active::{
    SetWebhookActiveError, SetWebhookActiveUseCase,
};
use crate::application::usecases::test_webhook::{TestWebhookError, TestWebhookUseCase};
use crate::domain::value_objects::ids::{SalonId, WebhookId};
use crate::domain::value_objects::timestamps::Timestamp;
use crate::interface::http::auth::Session;
use crate::interface::http::dto::delivery::{
    DeliveryResponse, DeliveryStatsResponse, ListDeliveriesQuery, ListDeliveriesResponse,
};
use crate::interface::http::dto::webhook::{
    CreateWebhookRequest, CreateWebhookResponse, ListWebhooksResponse, TestWebhookResponse,
    UpdateWebhookRequest, WebhookResponse,
};
use crate::interface::http::problem::{
    WH_CONFLICT, WH_INTERNAL, WH_REQUEST_MALFORMED, WH_STORAGE_UNAVAILABLE,
    WH_VALIDATION_FAILED, WH_WEBHOOK_NOT_FOUND, problem,
};
use crate::interface::http::state::AppState;
use crate::interface::http::trace::TraceId;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Extension, Json};
use tracing::{error, info};

/// Builds the session-protected webhook routes.
pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(
            "/salons/{salon_id}/webhooks",
            post(create_webhook).get(list_webhooks),
        )
        .route(
            "/salons/{salon_id}/webhooks/{webhook_id}",
            patch(update_webhook).delete(delete_webhook),
        )
        .route(
            "/salons/{salon_id}/webhooks/{webhook_id}/test",
            post(test_webhook),
        )
        .route(
            "/salons/{salon_id}/webhooks/{webhook_id}/deliveries",
            get(list_deliveries),
        )
        .route(
            "/salons/{salon_id}/webhook-deliveries/stats",
            get(delivery_stats),
        )
}

/// Per-request data every handler needs to build a problem response.
struct RequestInfo {
    path: String,
    trace_id: Option<String>,
}

impl RequestInfo {
    fn new(uri: &Uri, trace: Option<Extension<TraceId>>) -> Self {
        Self {
            path: uri.path().to_string(),
            trace_id: trace.map(|Extension(t)| t.0),
        }
    }

    fn problem(&self, status: StatusCode, code: &str, detail: impl Into<String>) -> Response {
        problem(
            status,
            code,
            Some(detail.into()),
            Some(self.path.clone()),
            self.trace_id.clone(),
        )
    }

    fn malformed(&self, detail: impl Into<String>) -> Response {
        self.problem(StatusCode::BAD_REQUEST, WH_REQUEST_MALFORMED, detail)
    }

    fn not_found(&self) -> Response {
        self.problem(StatusCode::NOT_FOUND, WH_WEBHOOK_NOT_FOUND, "webhook not found")
    }

    fn storage(&self, cause: &str) -> Response {
        error!(
            trace_id = self.trace_id.as_deref().unwrap_or(""),
            path = %self.path,
            error = cause,
            "storage unavailable"
        );
        self.problem(
            StatusCode::SERVICE_UNAVAILABLE,
            WH_STORAGE_UNAVAILABLE,
            "storage unavailable",
        )
    }
}

fn parse_salon_id(raw: &str, info: &RequestInfo) -> Result<SalonId, Response> {
    SalonId::parse(raw).ok_or_else(|| info.malformed("invalid salon_id"))
}

fn parse_webhook_id(raw: &str, info: &RequestInfo) -> Result<WebhookId, Response> {
    WebhookId::parse(raw).ok_or_else(|| info.malformed("invalid webhook_id"))
}

/// Creates a webhook. The response is the only place the secret is ever returned.
async fn create_webhook(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    trace: Option<Extension<TraceId>>,
    uri: Uri,
    Path(salon_id): Path<String>,
    payload: Result<Json<CreateWebhookRequest>, JsonRejection>,
) -> Response {
    let info = RequestInfo::new(&uri, trace);

    // Step 1: Parse the path and authorize the caller.
    let salon_id = match parse_salon_id(&salon_id, &info) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(resp) = session.require_manage(salon_id, &info.path) {
        return resp;
    }

    // Step 2: Decode the body.
    let Json(payload) = match payload {
        Ok(body) => body,
        Err(rejection) => return info.malformed(rejection.body_text()),
    };

    // Step 3: Execute the use case.
    let result = CreateWebhookUseCase::execute(
        &state.ctx,
        CreateWebhookCommand {
            salon_id,
            name: payload.name,
            url: payload.url,
            events: payload.events,
            secret: payload.secret,
        },
    )
    .await;

    // Step 4: Map output to HTTP response.
    match result {
        Ok(created) => {
            info!(
                salon_id = %salon_id,
                webhook_id = %created.webhook.id,
                user_id = %session.user_id,
                "webhook created"
            );
            (
                StatusCode::CREATED,
                Json(CreateWebhookResponse::from(created)),
            )
                .into_response()
        }
        Err(CreateWebhookError::Validation(detail)) => {
            info.problem(StatusCode::UNPROCESSABLE_ENTITY, WH_VALIDATION_FAILED, detail)
        }
        Err(CreateWebhookError::Conflict) => {
            info.problem(StatusCode::CONFLICT, WH_CONFLICT, "webhook already exists")
        }
        Err(CreateWebhookError::Storage(cause)) => info.storage(&cause),
    }
}

/// Lists a salon's webhooks with secrets redacted.
async fn list_webhooks(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    trace: Option<Extension<TraceId>>,
    uri: Uri,
    Path(salon_id): Path<String>,
) -> Response {
    let info = RequestInfo::new(&uri, trace);

    let salon_id = match parse_salon_id(&salon_id, &info) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(resp) = session.require_salon(salon_id, &info.path) {
        return resp;
    }

    match ListWebhooksUseCase::execute(&state.ctx, salon_id).await {
        Ok(webhooks) => Json(ListWebhooksResponse {
            webhooks: webhooks.iter().map(WebhookResponse::from).collect(),
        })
        .into_response(),
        Err(ListWebhooksError::Storage(cause)) => info.storage(&cause),
    }
}

/// Activates or deactivates a webhook.
async fn update_webhook(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    trace: Option<Extension<TraceId>>,
    uri: Uri,
    Path((salon_id, webhook_id)): Path<(String, String)>,
    payload: Result<Json<UpdateWebhookRequest>, JsonRejection>,
) -> Response {
    let info = RequestInfo::new(&uri, trace);

    // Step 1: Parse ids and authorize.
    let salon_id = match parse_salon_id(&salon_id, &info) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let webhook_id = match parse_webhook_id(&webhook_id, &info) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(resp) = session.require_manage(salon_id, &info.path) {
        return resp;
    }
    let Json(payload) = match payload {
        Ok(body) => body,
        Err(rejection) => return info.malformed(rejection.body_text()),
    };

    // Step 2: Execute and map.
    match SetWebhookActiveUseCase::execute(&state.ctx, salon_id, webhook_id, payload.is_active)
        .await
    {
        Ok(summary) => Json(WebhookResponse::from(&summary)).into_response(),
        Err(SetWebhookActiveError::NotFound) => info.not_found(),
        Err(SetWebhookActiveError::Storage(cause)) => info.storage(&cause),
    }
}

/// Deletes a webhook. Its queued deliveries are skipped by the worker.
async fn delete_webhook(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    trace: Option<Extension<TraceId>>,
    uri: Uri,
    Path((salon_id, webhook_id)): Path<(String, String)>,
) -> Response {
    let info = RequestInfo::new(&uri, trace);

    let salon_id = match parse_salon_id(&salon_id, &info) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let webhook_id = match parse_webhook_id(&webhook_id, &info) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(resp) = session.require_manage(salon_id, &info.path) {
        return resp;
    }

    match DeleteWebhookUseCase::execute(&state.ctx, salon_id, webhook_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(DeleteWebhookError::NotFound) => info.not_found(),
        Err(DeleteWebhookError::Storage(cause)) => info.storage(&cause),
    }
}

/// Sends a signed sample event synchronously. Receiver failures are a 200 with `success: false`.
async fn test_webhook(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    trace: Option<Extension<TraceId>>,
    uri: Uri,
    Path((salon_id, webhook_id)): Path<(String, String)>,
) -> Response {
    let info = RequestInfo::new(&uri, trace);

    let salon_id = match parse_salon_id(&salon_id, &info) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let webhook_id = match parse_webhook_id(&webhook_id, &info) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(resp) = session.require_manage(salon_id, &info.path) {
        return resp;
    }

    match TestWebhookUseCase::execute(&state.ctx, salon_id, webhook_id).await {
        Ok(result) => Json(TestWebhookResponse::from(result)).into_response(),
        Err(TestWebhookError::NotFound) => info.not_found(),
        Err(TestWebhookError::Storage(cause)) => info.storage(&cause),
        Err(TestWebhookError::Encoding(cause)) => {
            error!(error = %cause, "test payload encoding failed");
            info.problem(
                StatusCode::INTERNAL_SERVER_ERROR,
                WH_INTERNAL,
                "internal error",
            )
        }
    }
}

/// Recent deliveries of one webhook, newest first.
async fn list_deliveries(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    trace: Option<Extension<TraceId>>,
    uri: Uri,
    Path((salon_id, webhook_id)): Path<(String, String)>,
    query: Result<Query<ListDeliveriesQuery>, QueryRejection>,
) -> Response {
    let info = RequestInfo::new(&uri, trace);

    let salon_id = match parse_salon_id(&salon_id, &info) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let webhook_id = match parse_webhook_id(&webhook_id, &info) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(resp) = session.require_salon(salon_id, &info.path) {
        return resp;
    }
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return info.malformed(rejection.body_text()),
    };

    let max_attempts = state.ctx.settings.delivery.max_attempts;
    match ListWebhookDeliveriesUseCase::execute(&state.ctx, salon_id, webhook_id, query.limit)
        .await
    {
        Ok(deliveries) => Json(ListDeliveriesResponse {
            deliveries: deliveries
                .iter()
                .map(|d| DeliveryResponse::from_delivery(d, max_attempts))
                .collect(),
        })
        .into_response(),
        Err(ListWebhookDeliveriesError::NotFound) => info.not_found(),
        Err(ListWebhookDeliveriesError::Storage(cause)) => info.storage(&cause),
    }
}

/// Delivery counts across all of a salon's webhooks.
async fn delivery_stats(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    trace: Option<Extension<TraceId>>,
    uri: Uri,
    Path(salon_id): Path<String>,
) -> Response {
    let info = RequestInfo::new(&uri, trace);

    let salon_id = match parse_salon_id(&salon_id, &info) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    if let Err(resp) = session.require_salon(salon_id, &info.path) {
        return resp;
    }

    match DeliveryStatsUseCase::execute(&state.ctx, salon_id, Timestamp::now_utc()).await {
        Ok(stats) => Json(DeliveryStatsResponse::from(stats)).into_response(),
        Err(DeliveryStatsError::Storage(cause)) => info.storage(&cause),
    }
}
