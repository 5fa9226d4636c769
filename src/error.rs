use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors a user can see. The message is displayable as-is.
///
/// Translation failures never appear here; the gateway absorbs them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdvisorError {
    /// Required input missing; no external call was made.
    #[error("{0}")]
    Validation(String),

    /// The canonical fetch failed.
    #[error("{0}")]
    Fetch(String),
}

impl AdvisorError {
    pub fn message(&self) -> &str {
        match self {
            AdvisorError::Validation(m) | AdvisorError::Fetch(m) => m,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AdvisorError::Validation(_) => "validation",
            AdvisorError::Fetch(_) => "fetch",
        }
    }
}

impl IntoResponse for AdvisorError {
    fn into_response(self) -> Response {
        let status = match self {
            AdvisorError::Validation(_) => StatusCode::BAD_REQUEST,
            AdvisorError::Fetch(_) => StatusCode::BAD_GATEWAY,
        };

        let body = Json(json!({
            "error": {
                "message": self.message(),
                "details": self.kind(),
            }
        }));

        (status, body).into_response()
    }
}

pub type AdvisorResult<T> = Result<T, AdvisorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_user_message() {
        let err = AdvisorError::Fetch("Failed to get market trends from AI.".to_string());
        assert_eq!(err.to_string(), "Failed to get market trends from AI.");
    }

    #[test]
    fn test_validation_maps_to_bad_request() {
        let response = AdvisorError::Validation("Please provide both a region and a crop.".into())
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_fetch_maps_to_bad_gateway() {
        let response = AdvisorError::Fetch("Failed".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
