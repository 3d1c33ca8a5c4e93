use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// RFC 7807 Problem Details payload.
#[derive(Debug, Serialize)]
pub struct ProblemDetails {
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type")]
    pub r#type: String,
    /// A short, human-readable summary of the problem type.
    pub title: String,
    /// The HTTP status code for this occurrence.
    pub status: u16,
    /// A human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// A URI reference that identifies this specific occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    /// A stable, machine-readable application error code (WH_...).
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

/// Build a Problem Details response with the correct content-type.
pub fn problem(
    status: StatusCode,
    code: &str,
    detail: Option<String>,
    instance: Option<String>,
    trace_id: Option<String>,
) -> Response {
    // Step 1: Build the problem payload.
    let payload = ProblemDetails {
        r#type: "about:blank".to_string(),
        title: status.canonical_reason().unwrap_or("Error").to_string(),
        status: status.as_u16(),
        detail,
        instance,
        code: code.to_string(),
        trace_id,
    };

    // Step 2: Convert to an HTTP response with JSON body.
    let mut response = (status, Json(payload)).into_response();

    // Step 3: Ensure RFC 7807 content type.
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/problem+json"),
    );

    response
}

pub const WH_REQUEST_MALFORMED: &str = "WH_REQUEST_MALFORMED";
pub const WH_VALIDATION_FAILED: &str = "WH_VALIDATION_FAILED";
pub const WH_AUTH_INVALID_CREDENTIALS: &str = "WH_AUTH_INVALID_CREDENTIALS";
pub const WH_AUTH_FORBIDDEN: &str = "WH_AUTH_FORBIDDEN";
pub const WH_WEBHOOK_NOT_FOUND: &str = "WH_WEBHOOK_NOT_FOUND";
pub const WH_CONFLICT: &str = "WH_CONFLICT";
pub const WH_STORAGE_UNAVAILABLE: &str = "WH_STORAGE_UNAVAILABLE";
pub const WH_INTERNAL: &str = "WH_INTERNAL";
