//! Reaction and follow handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{FollowRequest, MessageResponse, PageParams, ReactionRequest};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, MarketError};
use crate::persistence::models::{FollowRow, ReactionRow};

/// `POST /api/reactions` — Like or watch an item.
///
/// # Errors
///
/// Returns [`MarketError::InvalidReactionType`] for an unknown kind and
/// [`MarketError::NotFound`] for an unknown item or user.
#[utoipa::path(
    post,
    path = "/api/reactions",
    tag = "Reactions",
    summary = "Add reaction",
    description = "Upserts the reaction. A like refreshes the item's like count before the response is sent.",
    request_body = ReactionRequest,
    responses(
        (status = 201, description = "Reaction stored", body = ReactionRow),
        (status = 400, description = "Invalid reaction type", body = ErrorResponse),
        (status = 404, description = "Item or user not found", body = ErrorResponse),
    )
)]
pub async fn add_reaction(
    State(state): State<AppState>,
    Json(req): Json<ReactionRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let reaction = req.reaction()?;
    let row = state
        .social
        .add_reaction(&req.item_id, &req.user_id, reaction)
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `DELETE /api/reactions` — Withdraw a reaction.
///
/// # Errors
///
/// Returns [`MarketError::NotFound`] when no such reaction exists.
#[utoipa::path(
    delete,
    path = "/api/reactions",
    tag = "Reactions",
    summary = "Remove reaction",
    request_body = ReactionRequest,
    responses(
        (status = 200, description = "Reaction removed", body = MessageResponse),
        (status = 400, description = "Invalid reaction type", body = ErrorResponse),
        (status = 404, description = "Reaction not found", body = ErrorResponse),
    )
)]
pub async fn remove_reaction(
    State(state): State<AppState>,
    Json(req): Json<ReactionRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let reaction = req.reaction()?;
    state
        .social
        .remove_reaction(&req.item_id, &req.user_id, reaction)
        .await?;
    Ok(Json(MessageResponse::new("reaction removed")))
}

/// `GET /api/reactions/items/{itemId}` — Reactions on an item.
///
/// # Errors
///
/// Returns [`MarketError::Storage`] on database failure.
#[utoipa::path(
    get,
    path = "/api/reactions/items/{itemId}",
    tag = "Reactions",
    summary = "Item reactions",
    params(("itemId" = String, Path, description = "Item ID")),
    responses((status = 200, description = "Reactions, newest first", body = Vec<ReactionRow>))
)]
pub async fn item_reactions(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.social.item_reactions(&item_id).await?))
}

/// `GET /api/reactions/users/{userId}` — Reactions by a user.
///
/// # Errors
///
/// Returns [`MarketError::Storage`] on database failure.
#[utoipa::path(
    get,
    path = "/api/reactions/users/{userId}",
    tag = "Reactions",
    summary = "User reactions",
    params(("userId" = String, Path, description = "User ID"), PageParams),
    responses((status = 200, description = "Reactions, newest first", body = Vec<ReactionRow>))
)]
pub async fn user_reactions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.social.user_reactions(&user_id, page.into()).await?))
}

/// `POST /api/follows` — Follow a user.
///
/// # Errors
///
/// Returns [`MarketError::InvalidRequest`] for a self-follow and
/// [`MarketError::NotFound`] for unknown users.
#[utoipa::path(
    post,
    path = "/api/follows",
    tag = "Follows",
    summary = "Follow user",
    description = "Idempotent. The followee's follower count is refreshed before the response is sent.",
    request_body = FollowRequest,
    responses(
        (status = 201, description = "Following", body = FollowRow),
        (status = 400, description = "Self-follow", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn follow_user(
    State(state): State<AppState>,
    Json(req): Json<FollowRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let row = state
        .social
        .follow_user(&req.follower_id, &req.followee_id)
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `DELETE /api/follows` — Stop following a user.
///
/// # Errors
///
/// Returns [`MarketError::NotFound`] when the follow does not exist.
#[utoipa::path(
    delete,
    path = "/api/follows",
    tag = "Follows",
    summary = "Unfollow user",
    request_body = FollowRequest,
    responses(
        (status = 200, description = "Unfollowed", body = MessageResponse),
        (status = 404, description = "Follow not found", body = ErrorResponse),
    )
)]
pub async fn unfollow_user(
    State(state): State<AppState>,
    Json(req): Json<FollowRequest>,
) -> Result<impl IntoResponse, MarketError> {
    state
        .social
        .unfollow_user(&req.follower_id, &req.followee_id)
        .await?;
    Ok(Json(MessageResponse::new("unfollowed")))
}

/// `GET /api/follows/followers/{userId}` — Who follows the user.
///
/// # Errors
///
/// Returns [`MarketError::Storage`] on database failure.
#[utoipa::path(
    get,
    path = "/api/follows/followers/{userId}",
    tag = "Follows",
    summary = "Followers",
    params(("userId" = String, Path, description = "User ID"), PageParams),
    responses((status = 200, description = "Followers, newest first", body = Vec<FollowRow>))
)]
pub async fn followers(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.social.followers(&user_id, page.into()).await?))
}

/// `GET /api/follows/following/{userId}` — Whom the user follows.
///
/// # Errors
///
/// Returns [`MarketError::Storage`] on database failure.
#[utoipa::path(
    get,
    path = "/api/follows/following/{userId}",
    tag = "Follows",
    summary = "Following",
    params(("userId" = String, Path, description = "User ID"), PageParams),
    responses((status = 200, description = "Followees, newest first", body = Vec<FollowRow>))
)]
pub async fn following(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.social.following(&user_id, page.into()).await?))
}

/// Reaction and follow routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reactions", post(add_reaction).delete(remove_reaction))
        .route("/reactions/items/{itemId}", get(item_reactions))
        .route("/reactions/users/{userId}", get(user_reactions))
        .route("/follows", post(follow_user).delete(unfollow_user))
        .route("/follows/followers/{userId}", get(followers))
        .route("/follows/following/{userId}", get(following))
}
