use crate::domain::value_objects::ids::SalonId;
use crate::interface::http::problem::{
    WH_AUTH_FORBIDDEN, WH_AUTH_INVALID_CREDENTIALS, problem,
};
use crate::interface::http::state::AppState;
use crate::interface::http::trace::TraceId;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    Staff,
}

impl Role {
    /// Owners and admins may change webhook configuration.
    pub fn can_manage_webhooks(&self) -> bool {
        matches!(self, Role::Owner | Role::Admin)
    }
}

/// Claims of a session token issued by the admin UI's auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub salon_id: uuid::Uuid,
    pub role: Role,
    pub exp: u64,
}

/// The authenticated caller, attached to request extensions by `session_middleware`.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub salon_id: SalonId,
    pub role: Role,
}

impl Session {
    /// Allow reads of the session's own salon only.
    pub fn require_salon(&self, salon_id: SalonId, path: &str) -> Result<(), Response> {
        if self.salon_id != salon_id {
            return Err(forbidden("session does not belong to this salon", path));
        }
        Ok(())
    }

    /// Allow configuration changes by owners and admins of the salon.
    pub fn require_manage(&self, salon_id: SalonId, path: &str) -> Result<(), Response> {
        self.require_salon(salon_id, path)?;
        if !self.role.can_manage_webhooks() {
            return Err(forbidden("role may not manage webhooks", path));
        }
        Ok(())
    }
}

fn forbidden(detail: &str, path: &str) -> Response {
    problem(
        StatusCode::FORBIDDEN,
        WH_AUTH_FORBIDDEN,
        Some(detail.to_string()),
        Some(path.to_string()),
        None,
    )
}

fn unauthorized(detail: &str, path: &str, trace_id: Option<String>) -> Response {
    problem(
        StatusCode::UNAUTHORIZED,
        WH_AUTH_INVALID_CREDENTIALS,
        Some(detail.to_string()),
        Some(path.to_string()),
        trace_id,
    )
}

fn bearer_token(req: &Request<Body>) -> Option<&str> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() { None } else { Some(token) }
}

/// Verify an HS256 session token and return its claims.
pub fn verify_session_token(token: &str, secret: &str) -> Option<SessionClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["exp", "sub"]);

    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .ok()
    .map(|data| data.claims)
}

/// Compare a presented trigger token with the configured one in constant time.
///
/// Both sides are hashed first so the comparison length does not depend on input.
/// An empty configured token matches nothing.
pub fn trigger_token_matches(presented: &str, configured: &str) -> bool {
    if configured.is_empty() {
        return false;
    }
    let presented = Sha256::digest(presented.as_bytes());
    let configured = Sha256::digest(configured.as_bytes());
    presented.as_slice().ct_eq(configured.as_slice()).into()
}

/// Validates the session token and injects the caller `Session` into the request.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let trace_id = req.extensions().get::<TraceId>().map(|t| t.0.clone());
    let path = req.uri().path().to_string();

    // Step 1: extract the Bearer token from the Authorization header.
    let Some(token) = bearer_token(&req) else {
        return Err(unauthorized("missing bearer token", &path, trace_id));
    };

    // Step 2: verify signature and expiry.
    let Some(claims) = verify_session_token(token, &state.ctx.settings.auth.jwt_secret) else {
        return Err(unauthorized("invalid session token", &path, trace_id));
    };

    // Step 3: attach the session for handlers.
    req.extensions_mut().insert(Session {
        user_id: claims.sub,
        salon_id: SalonId(claims.salon_id),
        role: claims.role,
    });
    Ok(next.run(req).await)
}

/// Guards internal endpoints with the shared trigger token. Rejects before any work.
pub async fn trigger_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let trace_id = req.extensions().get::<TraceId>().map(|t| t.0.clone());
    let path = req.uri().path().to_string();

    let authorized = bearer_token(&req).is_some_and(|token| {
        trigger_token_matches(token, &state.ctx.settings.delivery.trigger_token)
    });
    if !authorized {
        return Err(unauthorized("invalid trigger token", &path, trace_id));
    }
    Ok(next.run(req).await)
}
