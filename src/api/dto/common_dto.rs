//! Shared DTO types used across multiple endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::service::social::Page;

/// `limit` / `offset` query parameters for list endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Maximum rows (defaults to 50).
    pub limit: Option<i64>,
    /// Rows to skip (defaults to 0).
    pub offset: Option<i64>,
}

impl From<PageParams> for Page {
    fn from(params: PageParams) -> Self {
        Self::new(params.limit, params.offset)
    }
}

/// Body returned by endpoints that create a row without echoing it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreatedResponse {
    /// ID of the new row.
    pub id: String,
    /// Human-readable outcome.
    pub message: String,
}

/// Body returned by endpoints that only acknowledge success.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: String,
}

impl MessageResponse {
    /// Wraps `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
