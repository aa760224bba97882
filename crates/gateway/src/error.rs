//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as a JSON body
//! `{"error": ..., "message": ...}`; upstream diagnostics are logged and sent
//! to Sentry but never echoed to the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::upstream::UpstreamError;

/// Application-level error type for the gateway.
#[derive(Debug, Error)]
pub enum AppError {
    /// An upstream call failed after retries.
    #[error("{context}: {source}")]
    Upstream {
        /// What the gateway was trying to do, shown to the client.
        context: &'static str,
        #[source]
        source: UpstreamError,
    },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wrap an upstream failure with a client-facing description.
    #[must_use]
    pub const fn upstream(context: &'static str, source: UpstreamError) -> Self {
        Self::Upstream { context, source }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Upstream { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// JSON error body returned to clients.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Upstream { .. } | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose upstream or internal details to clients
        let body = match &self {
            Self::Upstream { context, .. } => ErrorBody {
                error: (*context).to_string(),
                message: "The catalog service is unavailable. Please try again later.".to_string(),
            },
            Self::NotFound(what) => ErrorBody {
                error: "Not found".to_string(),
                message: what.clone(),
            },
            Self::BadRequest(why) => ErrorBody {
                error: "Bad request".to_string(),
                message: why.clone(),
            },
            Self::Internal(_) => ErrorBody {
                error: "Internal server error".to_string(),
                message: "Something went wrong. Please try again later.".to_string(),
            },
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 42".to_string());
        assert_eq!(err.to_string(), "Not found: product 42");

        let err = AppError::upstream("Failed to fetch products", UpstreamError::Timeout);
        assert_eq!(
            err.to_string(),
            "Failed to fetch products: upstream request timed out"
        );
    }

    #[tokio::test]
    async fn test_upstream_error_hides_details() {
        let err = AppError::upstream(
            "Failed to fetch products",
            UpstreamError::Malformed("secret internal detail".to_string()),
        );
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch products");
        assert!(!body["message"].as_str().unwrap().contains("secret"));
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let (status, body) = body_json(AppError::NotFound("Product 9 not found".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not found");
        assert_eq!(body["message"], "Product 9 not found");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::BadRequest("x".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal("x".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
