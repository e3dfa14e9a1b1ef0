//! Moderation handlers. Everything under `/admin` requires an admin caller.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    AdminUsersQuery, CreatedResponse, MessageResponse, ReportUserRequest, SetAdminRequest,
};
use crate::api::middleware::{AdminCaller, CallerId};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, MarketError};
use crate::persistence::counters::SyncReport;
use crate::persistence::models::{AdminUserRow, ReportRow};
use crate::service::admin::UserDetail;

/// `POST /api/reports` — Report another user.
///
/// # Errors
///
/// Returns [`MarketError::Unauthorized`] without identity and
/// [`MarketError::InvalidRequest`] for a self-report or blank reason.
#[utoipa::path(
    post,
    path = "/api/reports",
    tag = "Moderation",
    summary = "Report user",
    params(("X-User-Id" = String, Header, description = "Reporter user ID")),
    request_body = ReportUserRequest,
    responses(
        (status = 201, description = "Report filed", body = CreatedResponse),
        (status = 400, description = "Invalid report", body = ErrorResponse),
        (status = 401, description = "No caller identity", body = ErrorResponse),
    )
)]
pub async fn report_user(
    State(state): State<AppState>,
    CallerId(reporter_id): CallerId,
    Json(req): Json<ReportUserRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let id = state
        .admin
        .report_user(
            &reporter_id,
            &req.reported_user_id,
            &req.reason,
            req.description.as_deref(),
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id: id.into_string(),
            message: "report submitted".to_string(),
        }),
    ))
}

/// `GET /api/admin/reports` — Every report, newest first.
///
/// # Errors
///
/// Returns 401/403 for non-admin callers.
#[utoipa::path(
    get,
    path = "/api/admin/reports",
    tag = "Moderation",
    summary = "List reports",
    params(("X-User-Id" = String, Header, description = "Admin user ID")),
    responses(
        (status = 200, description = "Reports", body = Vec<ReportRow>),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
    )
)]
pub async fn list_reports(
    State(state): State<AppState>,
    _admin: AdminCaller,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.admin.reports().await?))
}

/// `GET /api/admin/users` — Users with pending report counts.
///
/// # Errors
///
/// Returns 401/403 for non-admin callers.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Moderation",
    summary = "List users for moderation",
    params(("X-User-Id" = String, Header, description = "Admin user ID"), AdminUsersQuery),
    responses(
        (status = 200, description = "Users", body = Vec<AdminUserRow>),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminCaller,
    Query(query): Query<AdminUsersQuery>,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.admin.users(query.reported_only()).await?))
}

/// `GET /api/admin/users/{id}` — Profile, reports and trades of a user.
///
/// # Errors
///
/// Returns 401/403 for non-admin callers and [`MarketError::NotFound`]
/// for an unknown user.
#[utoipa::path(
    get,
    path = "/api/admin/users/{id}",
    tag = "Moderation",
    summary = "User detail",
    params(("X-User-Id" = String, Header, description = "Admin user ID"), ("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User detail", body = UserDetail),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn user_detail(
    State(state): State<AppState>,
    _admin: AdminCaller,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.admin.user_detail(&id).await?))
}

/// `POST /api/admin/db-set-admin` — Grant or revoke admin rights.
///
/// # Errors
///
/// Returns 401/403 for non-admin callers and [`MarketError::NotFound`]
/// for an unknown user.
#[utoipa::path(
    post,
    path = "/api/admin/db-set-admin",
    tag = "Moderation",
    summary = "Set admin flag",
    params(("X-User-Id" = String, Header, description = "Admin user ID")),
    request_body = SetAdminRequest,
    responses(
        (status = 200, description = "Flag updated", body = MessageResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn set_admin(
    State(state): State<AppState>,
    AdminCaller(caller): AdminCaller,
    Json(req): Json<SetAdminRequest>,
) -> Result<impl IntoResponse, MarketError> {
    state.admin.set_admin(&req.user_id, req.is_admin).await?;
    tracing::info!(by = %caller, user_id = %req.user_id, is_admin = req.is_admin, "admin flag set");
    Ok(Json(MessageResponse::new("admin flag updated")))
}

/// `POST /api/admin/sync-counters` — Run every counter resync pass.
///
/// # Errors
///
/// Returns 401/403 for non-admin callers.
#[utoipa::path(
    post,
    path = "/api/admin/sync-counters",
    tag = "Moderation",
    summary = "Resync denormalized counters",
    params(("X-User-Id" = String, Header, description = "Admin user ID")),
    responses(
        (status = 200, description = "Rows touched per pass", body = SyncReport),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
    )
)]
pub async fn sync_counters(
    State(state): State<AppState>,
    _admin: AdminCaller,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.admin.sync_counters().await?))
}

/// Moderation routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports", post(report_user))
        .route("/admin/reports", get(list_reports))
        .route("/admin/users", get(list_users))
        .route("/admin/users/{id}", get(user_detail))
        .route("/admin/db-set-admin", post(set_admin))
        .route("/admin/sync-counters", post(sync_counters))
}
