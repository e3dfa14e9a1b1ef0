//! Moderation DTOs.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Request body for `POST /api/reports`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportUserRequest {
    /// User being reported.
    pub reported_user_id: String,
    /// Short reason.
    pub reason: String,
    /// Details.
    pub description: Option<String>,
}

/// Query string of `GET /api/admin/users`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminUsersQuery {
    /// `reported` keeps users with pending reports.
    pub status: Option<String>,
}

impl AdminUsersQuery {
    /// Whether only reported users are requested.
    #[must_use]
    pub fn reported_only(&self) -> bool {
        self.status.as_deref() == Some("reported")
    }
}

/// Request body for `POST /api/admin/db-set-admin`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetAdminRequest {
    /// Target user.
    pub user_id: String,
    /// New flag value.
    #[serde(default)]
    pub is_admin: bool,
}
