//! AI assistant handlers. All answer 503 when no backend is configured.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::AnalyzeImageRequest;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, MarketError};
use crate::service::assistant::{
    DescriptionSuggestion, ImageAnalysis, PriceSuggestion, RiskAssessment, RiskAssessmentRequest,
    SuggestionRequest,
};

/// `POST /api/ai/risk-assessment` — Fraud risk of a listing.
///
/// # Errors
///
/// Returns [`MarketError::AiUnavailable`], [`MarketError::AiUpstream`] or
/// [`MarketError::AiResponse`] when the model cannot produce a verdict.
#[utoipa::path(
    post,
    path = "/api/ai/risk-assessment",
    tag = "AI",
    summary = "Assess listing risk",
    description = "Listings with critical keywords or a description under 20 characters get a fixed high-risk verdict without a model call.",
    request_body = RiskAssessmentRequest,
    responses(
        (status = 200, description = "Verdict", body = RiskAssessment),
        (status = 500, description = "Unparseable model output", body = ErrorResponse),
        (status = 502, description = "Model call failed", body = ErrorResponse),
        (status = 503, description = "AI not configured", body = ErrorResponse),
    )
)]
pub async fn risk_assessment(
    State(state): State<AppState>,
    Json(req): Json<RiskAssessmentRequest>,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.assistant.assess_risk(&req).await?))
}

/// `POST /api/ai/suggest-price` — Price suggestion.
///
/// # Errors
///
/// Same as [`risk_assessment`].
#[utoipa::path(
    post,
    path = "/api/ai/suggest-price",
    tag = "AI",
    summary = "Suggest price",
    request_body = SuggestionRequest,
    responses(
        (status = 200, description = "Suggestion", body = PriceSuggestion),
        (status = 502, description = "Model call failed", body = ErrorResponse),
        (status = 503, description = "AI not configured", body = ErrorResponse),
    )
)]
pub async fn suggest_price(
    State(state): State<AppState>,
    Json(req): Json<SuggestionRequest>,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.assistant.suggest_price(&req).await?))
}

/// `POST /api/ai/suggest-description` — Description suggestion.
///
/// # Errors
///
/// Same as [`risk_assessment`].
#[utoipa::path(
    post,
    path = "/api/ai/suggest-description",
    tag = "AI",
    summary = "Suggest description",
    request_body = SuggestionRequest,
    responses(
        (status = 200, description = "Suggestion", body = DescriptionSuggestion),
        (status = 502, description = "Model call failed", body = ErrorResponse),
        (status = 503, description = "AI not configured", body = ErrorResponse),
    )
)]
pub async fn suggest_description(
    State(state): State<AppState>,
    Json(req): Json<SuggestionRequest>,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.assistant.suggest_description(&req).await?))
}

/// `POST /api/ai/analyze` — Listing fields from a photo.
///
/// # Errors
///
/// Returns [`MarketError::InvalidRequest`] for an empty image,
/// [`MarketError::AiUnavailable`] or [`MarketError::AiUpstream`].
#[utoipa::path(
    post,
    path = "/api/ai/analyze",
    tag = "AI",
    summary = "Analyze image",
    request_body = AnalyzeImageRequest,
    responses(
        (status = 200, description = "Parsed fields plus raw text, or raw text only", body = ImageAnalysis),
        (status = 400, description = "Empty image", body = ErrorResponse),
        (status = 502, description = "Model call failed", body = ErrorResponse),
        (status = 503, description = "AI not configured", body = ErrorResponse),
    )
)]
pub async fn analyze_image(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeImageRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let analysis = state
        .assistant
        .analyze_image(&req.image_base64, req.prompt.as_deref())
        .await?;
    Ok(Json(analysis))
}

/// AI routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ai/risk-assessment", post(risk_assessment))
        .route("/ai/suggest-price", post(suggest_price))
        .route("/ai/suggest-description", post(suggest_description))
        .route("/ai/analyze", post(analyze_image))
}
