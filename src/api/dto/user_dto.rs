//! Profile and search DTOs.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::service::users::ProfileUpdate;

/// Request body for `POST /api/auth/me`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    /// Display name.
    pub name: String,
    /// Avatar URL.
    pub avatar_url: Option<String>,
    /// Free-text profile.
    pub bio: Option<String>,
}

impl From<ProfileRequest> for ProfileUpdate {
    fn from(req: ProfileRequest) -> Self {
        Self {
            name: req.name,
            avatar_url: req.avatar_url,
            bio: req.bio,
        }
    }
}

/// Query string of `GET /api/search`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Search text (required).
    pub q: Option<String>,
    /// Restrict items to one category code.
    pub category: Option<String>,
}
