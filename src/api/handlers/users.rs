//! User handlers: profiles, the caller's own profile and search.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{ProfileRequest, SearchParams};
use crate::api::middleware::CallerId;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, MarketError};
use crate::persistence::models::UserRow;
use crate::service::users::SearchResults;

/// `GET /api/users` — Every user.
///
/// # Errors
///
/// Returns [`MarketError::Storage`] on database failure.
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    summary = "List users",
    responses((status = 200, description = "Users", body = Vec<UserRow>))
)]
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.users.list_users().await?))
}

/// `GET /api/users/{id}` — One user.
///
/// # Errors
///
/// Returns [`MarketError::NotFound`] if the user does not exist.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    summary = "Get user",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserRow),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.users.get_user(&id).await?))
}

/// `GET /api/auth/me` — The caller's profile.
///
/// # Errors
///
/// Returns [`MarketError::Unauthorized`] without identity and
/// [`MarketError::NotFound`] before the first profile save.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Users",
    summary = "Current user",
    params(("X-User-Id" = String, Header, description = "Caller user ID")),
    responses(
        (status = 200, description = "Caller profile", body = UserRow),
        (status = 401, description = "No caller identity", body = ErrorResponse),
        (status = 404, description = "No profile yet", body = ErrorResponse),
    )
)]
pub async fn me(
    State(state): State<AppState>,
    CallerId(id): CallerId,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.users.get_user(&id).await?))
}

/// `POST /api/auth/me` — Create or update the caller's profile.
///
/// # Errors
///
/// Returns [`MarketError::Unauthorized`] without identity and
/// [`MarketError::InvalidRequest`] for a blank name.
#[utoipa::path(
    post,
    path = "/api/auth/me",
    tag = "Users",
    summary = "Save current user",
    params(("X-User-Id" = String, Header, description = "Caller user ID")),
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Saved profile", body = UserRow),
        (status = 400, description = "Blank name", body = ErrorResponse),
        (status = 401, description = "No caller identity", body = ErrorResponse),
    )
)]
pub async fn save_me(
    State(state): State<AppState>,
    CallerId(id): CallerId,
    Json(req): Json<ProfileRequest>,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.users.upsert_user(&id, req.into()).await?))
}

/// `GET /api/search` — Users by name, items by title or description.
///
/// # Errors
///
/// Returns [`MarketError::InvalidRequest`] when `q` is missing.
#[utoipa::path(
    get,
    path = "/api/search",
    tag = "Users",
    summary = "Search users and items",
    params(SearchParams),
    responses(
        (status = 200, description = "Matches", body = SearchResults),
        (status = 400, description = "Missing query", body = ErrorResponse),
    )
)]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, MarketError> {
    let results = state
        .users
        .search(
            params.q.as_deref().unwrap_or_default(),
            params.category.as_deref(),
        )
        .await?;
    Ok(Json(results))
}

/// User routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}", get(get_user))
        .route("/auth/me", get(me).post(save_me))
        .route("/search", get(search))
}
