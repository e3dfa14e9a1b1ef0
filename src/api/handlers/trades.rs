//! Transaction and review handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{CompletePurchaseRequest, CreateReviewRequest, CreateTransactionRequest};
use crate::api::middleware::AdminCaller;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, MarketError};
use crate::persistence::models::{
    AdminTransactionRow, ReviewRow, TransactionRow, UserTransactionRow,
};

/// `POST /api/transactions/complete` — Complete a purchase.
///
/// # Errors
///
/// Returns [`MarketError::NotFound`] for an unknown item or party and
/// [`MarketError::InvalidRequest`] when it is already sold out or the
/// seller does not match the listing.
#[utoipa::path(
    post,
    path = "/api/transactions/complete",
    tag = "Transactions",
    summary = "Complete purchase",
    description = "Marks the item sold out, decrements the seller's listing count (floored at zero), increments both parties' transaction counts and records a completed transaction, all in one database transaction.",
    request_body = CompletePurchaseRequest,
    responses(
        (status = 200, description = "Purchase completed", body = TransactionRow),
        (status = 400, description = "Invalid request, wrong seller or item already sold", body = ErrorResponse),
        (status = 404, description = "Item, buyer or seller not found", body = ErrorResponse),
    )
)]
pub async fn complete_purchase(
    State(state): State<AppState>,
    Json(req): Json<CompletePurchaseRequest>,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.trades.complete_purchase(req.into()).await?))
}

/// `POST /api/transactions` — Record a transaction of any type.
///
/// # Errors
///
/// Same as [`complete_purchase`] for type `purchase`.
#[utoipa::path(
    post,
    path = "/api/transactions",
    tag = "Transactions",
    summary = "Create transaction",
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Transaction recorded", body = TransactionRow),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse),
    )
)]
pub async fn create_transaction(
    State(state): State<AppState>,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let row = state.trades.create_transaction(req.into()).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `GET /api/transactions/user/{userId}` — Trades a user took part in.
///
/// # Errors
///
/// Returns [`MarketError::Storage`] on database failure.
#[utoipa::path(
    get,
    path = "/api/transactions/user/{userId}",
    tag = "Transactions",
    summary = "User transactions",
    params(("userId" = String, Path, description = "User ID")),
    responses((status = 200, description = "Trades, newest first", body = Vec<UserTransactionRow>))
)]
pub async fn user_transactions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.trades.user_transactions(&user_id).await?))
}

/// `GET /api/transactions` — Every trade (admin).
///
/// # Errors
///
/// Returns [`MarketError::Unauthorized`] or [`MarketError::Forbidden`]
/// for non-admin callers.
#[utoipa::path(
    get,
    path = "/api/transactions",
    tag = "Transactions",
    summary = "All transactions",
    params(("X-User-Id" = String, Header, description = "Admin user ID")),
    responses(
        (status = 200, description = "Trades, newest first", body = Vec<AdminTransactionRow>),
        (status = 401, description = "No caller identity", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
    )
)]
pub async fn all_transactions(
    State(state): State<AppState>,
    _admin: AdminCaller,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.trades.all_transactions().await?))
}

/// `POST /api/reviews` — Review a seller after a purchase.
///
/// # Errors
///
/// Returns [`MarketError::InvalidRequest`] for a self-review or bad rating
/// and [`MarketError::Forbidden`] without a completed purchase.
#[utoipa::path(
    post,
    path = "/api/reviews",
    tag = "Reviews",
    summary = "Create review",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review stored", body = ReviewRow),
        (status = 400, description = "Self-review or rating out of range", body = ErrorResponse),
        (status = 403, description = "No completed purchase between the users", body = ErrorResponse),
    )
)]
pub async fn create_review(
    State(state): State<AppState>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let row = state
        .trades
        .create_review(
            &req.reviewer_id,
            &req.reviewee_id,
            req.rating,
            req.comment.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `GET /api/reviews/user/{userId}` — Reviews a user received.
///
/// # Errors
///
/// Returns [`MarketError::Storage`] on database failure.
#[utoipa::path(
    get,
    path = "/api/reviews/user/{userId}",
    tag = "Reviews",
    summary = "User reviews",
    params(("userId" = String, Path, description = "User ID")),
    responses((status = 200, description = "Reviews, newest first", body = Vec<ReviewRow>))
)]
pub async fn user_reviews(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.trades.user_reviews(&user_id).await?))
}

/// Transaction and review routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(all_transactions).post(create_transaction))
        .route("/transactions/complete", post(complete_purchase))
        .route("/transactions/user/{userId}", get(user_transactions))
        .route("/reviews", post(create_review))
        .route("/reviews/user/{userId}", get(user_reviews))
}
