//! Marketplace error types with HTTP status code mapping.
//!
//! [`MarketError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid request: price is required",
///     "details": null
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
    /// Optional additional details (driver or upstream messages).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category            | HTTP Status                  |
/// |-----------|---------------------|------------------------------|
/// | 1000–1999 | Validation          | 400 Bad Request              |
/// | 2000–2099 | Not Found           | 404 Not Found                |
/// | 2100–2199 | Access              | 401 / 403                    |
/// | 3000–3099 | Server / Storage    | 500 Internal Server Error    |
/// | 3100–3199 | AI service          | 500 / 502 / 503              |
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Reaction type outside of `like` / `watch`.
    #[error("reactionType must be 'like' or 'watch', got '{0}'")]
    InvalidReactionType(String),

    /// Entity with the given ID was not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind (e.g. `"item"`).
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// No caller identity was supplied for a route that needs one.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is known but not allowed to perform the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Client exceeded rate limit.
    #[error("rate limit exceeded; retry after {retry_after_ms} ms")]
    RateLimited {
        /// Milliseconds until the client may retry.
        retry_after_ms: u64,
    },

    /// Database failure.
    #[error("storage error")]
    Storage(#[from] sqlx::Error),

    /// No generative AI backend is configured.
    #[error("ai service not configured")]
    AiUnavailable,

    /// The generative AI backend failed.
    #[error("ai service error: {0}")]
    AiUpstream(String),

    /// The generative AI backend answered with unusable content.
    #[error("failed to parse ai response: {0}")]
    AiResponse(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MarketError {
    /// Shorthand for [`MarketError::NotFound`].
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidReactionType(_) => 1002,
            Self::NotFound { .. } => 2001,
            Self::Unauthorized(_) => 2101,
            Self::Forbidden(_) => 2102,
            Self::RateLimited { .. } => 429,
            Self::Internal(_) => 3000,
            Self::Storage(_) => 3001,
            Self::AiUnavailable => 3101,
            Self::AiUpstream(_) => 3102,
            Self::AiResponse(_) => 3103,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::InvalidReactionType(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Storage(_) | Self::AiResponse(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::AiUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::AiUpstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Extra detail surfaced to the client, if any.
    fn details(&self) -> Option<String> {
        match self {
            Self::Storage(e) => Some(e.to_string()),
            Self::RateLimited { retry_after_ms } => Some(format!("retry_after_ms={retry_after_ms}")),
            _ => None,
        }
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, details = ?self.details(), "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: self.details(),
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
    fn validation_errors_map_to_bad_request() {
        let err = MarketError::InvalidRequest("price is required".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), 1001);
    }

    #[test]
    fn access_errors_are_distinct() {
        assert_eq!(
            MarketError::Unauthorized("missing X-User-Id".to_string()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            MarketError::Forbidden("no trade history".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn not_found_message_names_entity() {
        let err = MarketError::not_found("item", "42");
        assert_eq!(err.to_string(), "item not found: 42");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn storage_errors_carry_driver_details() {
        let err = MarketError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.details().is_some());
    }

    #[test]
    fn ai_errors_map_to_gateway_statuses() {
        assert_eq!(
            MarketError::AiUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            MarketError::AiUpstream("boom".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }
}
