//! System endpoints: health check and the category master.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::dto::MessageResponse;
use crate::api::middleware::AdminCaller;
use crate::app_state::AppState;
use crate::domain::CategoryNode;
use crate::error::{ErrorResponse, MarketError};

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    ai_configured: bool,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, current timestamp and whether an AI backend is wired in.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ai_configured: state.assistant.is_configured(),
        }),
    )
}

/// `GET /api/categories` — Current category tree.
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "System",
    summary = "Category master",
    responses(
        (status = 200, description = "Category tree", body = Vec<CategoryNode>),
    )
)]
pub async fn get_categories(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.categories.snapshot().await)
}

/// `PUT /api/categories` — Replace the category tree (admin).
///
/// # Errors
///
/// Returns 401/403 for non-admin callers and
/// [`MarketError::InvalidRequest`] for an empty tree.
#[utoipa::path(
    put,
    path = "/api/categories",
    tag = "System",
    summary = "Replace category master",
    params(("X-User-Id" = String, Header, description = "Admin user ID")),
    request_body = Vec<CategoryNode>,
    responses(
        (status = 200, description = "Tree replaced", body = MessageResponse),
        (status = 400, description = "Empty tree", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
    )
)]
pub async fn put_categories(
    State(state): State<AppState>,
    AdminCaller(caller): AdminCaller,
    Json(tree): Json<Vec<CategoryNode>>,
) -> Result<impl IntoResponse, MarketError> {
    let roots = tree.len();
    state.categories.replace(tree).await?;
    tracing::info!(by = %caller, roots, "category master replaced");
    Ok(Json(MessageResponse::new("categories updated")))
}

/// System routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/categories", get(get_categories).put(put_categories))
}
