//! Error types for the event hub and its HTTP surface.
//!
//! [`HubError`] covers everything that can go wrong between a producer
//! callback and a subscriber's queue. None of it ever reaches a producer:
//! the hub logs and absorbs it. [`GatewayError`] is what HTTP handlers
//! return; each variant maps to a status code and a structured JSON body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Failures inside the event hub.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The event could not be projected to JSON.
    #[error("event encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The subscriber's queue is full; it is not keeping up.
    #[error("subscriber {0} is lagging; queue full")]
    SubscriberLagging(uuid::Uuid),

    /// The subscription was closed before the send.
    #[error("subscription {0} is closed")]
    SubscriptionClosed(uuid::Uuid),

    /// The protocol layer refused to attach or detach a tracer.
    #[error("tracer for endpoint {endpoint}: {reason}")]
    Tracer {
        /// Endpoint the binding is for.
        endpoint: String,
        /// Protocol layer explanation.
        reason: String,
    },

    /// A LwM2M path string is malformed.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath {
        /// The rejected input.
        path: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid request: ep must not be blank"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category   | HTTP Status     |
/// |-----------|------------|-----------------|
/// | 1000–1999 | Validation | 400 Bad Request |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_request_maps_to_bad_request() {
        let err = GatewayError::InvalidRequest("ep must not be blank".to_string());
        assert_eq!(err.error_code(), 1001);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn hub_errors_render_their_cause() {
        let err = HubError::SubscriptionClosed(uuid::Uuid::nil());
        assert!(err.to_string().contains("closed"));
        let err = HubError::InvalidPath {
            path: "3/0".to_string(),
            reason: "must start with '/'".to_string(),
        };
        assert!(err.to_string().contains("3/0"));
    }
}
