//! Conversation and message handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{ConversationQuery, OpenConversationRequest, SendMessageRequest};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, MarketError};
use crate::persistence::models::{ConversationRow, MessageRow};
use crate::service::chat::Opened;

/// `POST /api/conversations` — Open (or reopen) a conversation.
///
/// # Errors
///
/// Returns [`MarketError::Storage`] for unknown items or users.
#[utoipa::path(
    post,
    path = "/api/conversations",
    tag = "Chat",
    summary = "Open conversation",
    description = "Returns the existing conversation for the same item, buyer and seller with 200, otherwise creates one and answers 201.",
    request_body = OpenConversationRequest,
    responses(
        (status = 200, description = "Existing conversation", body = ConversationRow),
        (status = 201, description = "Conversation created", body = ConversationRow),
    )
)]
pub async fn open_conversation(
    State(state): State<AppState>,
    Json(req): Json<OpenConversationRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let opened = state
        .chat
        .open_conversation(&req.item_id, &req.buyer_id, &req.seller_id)
        .await?;
    Ok(match opened {
        Opened::Existing(row) => (StatusCode::OK, Json(row)),
        Opened::Created(row) => (StatusCode::CREATED, Json(row)),
    })
}

/// `GET /api/conversations/{id}` — One conversation.
///
/// # Errors
///
/// Returns [`MarketError::NotFound`] if it does not exist.
#[utoipa::path(
    get,
    path = "/api/conversations/{id}",
    tag = "Chat",
    summary = "Get conversation",
    params(("id" = String, Path, description = "Conversation ID")),
    responses(
        (status = 200, description = "Conversation", body = ConversationRow),
        (status = 404, description = "Conversation not found", body = ErrorResponse),
    )
)]
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.chat.conversation(&id).await?))
}

/// `GET /api/conversations?userId=` — A user's conversations.
///
/// # Errors
///
/// Returns [`MarketError::InvalidRequest`] when `userId` is missing.
#[utoipa::path(
    get,
    path = "/api/conversations",
    tag = "Chat",
    summary = "List conversations",
    params(ConversationQuery),
    responses(
        (status = 200, description = "Conversations, most recently active first", body = Vec<ConversationRow>),
        (status = 400, description = "Missing userId", body = ErrorResponse),
    )
)]
pub async fn list_conversations(
    State(state): State<AppState>,
    Query(query): Query<ConversationQuery>,
) -> Result<impl IntoResponse, MarketError> {
    let user_id = query
        .user_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| MarketError::InvalidRequest("userId is required".to_string()))?;
    Ok(Json(state.chat.user_conversations(&user_id).await?))
}

/// `POST /api/messages` — Send a message.
///
/// # Errors
///
/// Returns [`MarketError::InvalidRequest`] for empty content and
/// [`MarketError::NotFound`] for an unknown conversation.
#[utoipa::path(
    post,
    path = "/api/messages",
    tag = "Chat",
    summary = "Send message",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message stored", body = MessageRow),
        (status = 400, description = "Empty content", body = ErrorResponse),
        (status = 404, description = "Conversation not found", body = ErrorResponse),
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let message = state
        .chat
        .send_message(&req.conversation_id, &req.sender_id, &req.content)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// `GET /api/conversations/{id}/messages` — Messages, oldest first.
///
/// # Errors
///
/// Returns [`MarketError::Storage`] on database failure.
#[utoipa::path(
    get,
    path = "/api/conversations/{id}/messages",
    tag = "Chat",
    summary = "List messages",
    params(("id" = String, Path, description = "Conversation ID")),
    responses((status = 200, description = "Messages, oldest first", body = Vec<MessageRow>))
)]
pub async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.chat.messages(&id).await?))
}

/// Chat routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/conversations", get(list_conversations).post(open_conversation))
        .route("/conversations/{id}", get(get_conversation))
        .route("/conversations/{id}/messages", get(list_messages))
        .route("/messages", post(send_message))
}
