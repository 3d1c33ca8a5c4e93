pub mod auth;
pub mod dto;
pub mod problem;
pub mod routes;
pub mod state;
pub mod trace;

use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};

use self::state::AppState;

/// Build the full router: public health checks, session-protected admin routes and
/// trigger-protected internal routes, all under trace-id and request logging.
pub fn app(state: AppState) -> Router {
    let admin = routes::webhook::router().route_layer(from_fn_with_state(
        state.clone(),
        auth::session_middleware,
    ));
    let internal = routes::internal::router().route_layer(from_fn_with_state(
        state.clone(),
        auth::trigger_middleware,
    ));

    Router::new()
        .merge(routes::health::router())
        .merge(routes::ready::router())
        .merge(routes::metrics::router())
        .merge(admin)
        .merge(internal)
        .layer(from_fn(trace::request_log_middleware))
        .layer(from_fn(trace::trace_id_middleware))
        .with_state(state)
}
