//! Conversation and message DTOs.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Request body for `POST /api/conversations`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenConversationRequest {
    /// Item discussed.
    pub item_id: String,
    /// Prospective buyer.
    pub buyer_id: String,
    /// Seller.
    pub seller_id: String,
}

/// Query string of `GET /api/conversations`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ConversationQuery {
    /// Participant whose conversations are listed (required).
    pub user_id: Option<String>,
}

/// Request body for `POST /api/messages`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    /// Target conversation.
    pub conversation_id: String,
    /// Author.
    pub sender_id: String,
    /// Message text.
    pub content: String,
}
