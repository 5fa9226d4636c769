use crate::api::AppState;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use subtle::ConstantTimeEq;
use tracing::warn;

/// Header carrying the shared API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Constant-time string comparison for secrets.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Reject requests without the configured API key. A no-op when no key is configured.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = state.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if constant_time_compare(provided, expected) {
        Ok(next.run(request).await)
    } else {
        warn!("Rejected request to {} with missing or invalid API key", request.uri().path());
        Err(StatusCode::UNAUTHORIZED)
    }
}
