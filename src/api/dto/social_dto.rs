//! Reaction and follow DTOs.

use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::ReactionType;
use crate::error::MarketError;

/// Request body for `POST /api/reactions` and `DELETE /api/reactions`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRequest {
    /// Item reacted to.
    pub item_id: String,
    /// Reacting user.
    pub user_id: String,
    /// `like` or `watch`.
    pub reaction_type: String,
}

impl ReactionRequest {
    /// Parses the reaction kind.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidRequest`] for blank IDs and
    /// [`MarketError::InvalidReactionType`] for an unknown kind.
    pub fn reaction(&self) -> Result<ReactionType, MarketError> {
        if self.item_id.trim().is_empty() || self.user_id.trim().is_empty() {
            return Err(MarketError::InvalidRequest(
                "itemId and userId are required".to_string(),
            ));
        }
        self.reaction_type.parse()
    }
}

/// Request body for `POST /api/follows` and `DELETE /api/follows`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    /// User who follows.
    pub follower_id: String,
    /// User being followed.
    pub followee_id: String,
}
