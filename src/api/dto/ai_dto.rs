//! AI assistant DTOs. Request and result shapes of the pipeline itself
//! live in [`crate::service::assistant`].

use serde::Deserialize;
use utoipa::ToSchema;

/// Request body for `POST /api/ai/analyze`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeImageRequest {
    /// Base64 image, optionally as a `data:` URL.
    pub image_base64: String,
    /// Custom instruction replacing the default one.
    pub prompt: Option<String>,
}
