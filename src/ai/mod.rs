//! Generative AI adapters.
//!
//! The assistant pipeline talks to a [`TextGenerator`]; the binary injects a
//! [`GeminiClient`] when an API key is configured, tests inject stubs.

pub mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;

/// Failure of a single generation call against one model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    /// The backend does not know the model. The caller may try the next one.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// Any other backend failure (transport, quota, bad request).
    #[error("upstream failure: {0}")]
    Upstream(String),
}

/// Base64 image handed to [`TextGenerator::analyze_image`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    /// MIME type, e.g. `image/jpeg`.
    pub mime_type: String,
    /// Base64 payload without any `data:` prefix.
    pub data: String,
}

impl InlineImage {
    /// Builds an image from either a bare base64 payload or a
    /// `data:<mime>;base64,<payload>` URL. Bare payloads are assumed JPEG.
    #[must_use]
    pub fn from_base64(raw: &str) -> Self {
        let raw = raw.trim();
        if let Some((header, data)) = raw.strip_prefix("data:").and_then(|rest| rest.split_once(',')) {
            let mime_type = header
                .split(';')
                .next()
                .filter(|m| !m.is_empty())
                .unwrap_or("image/jpeg");
            return Self {
                mime_type: mime_type.to_string(),
                data: data.to_string(),
            };
        }
        Self {
            mime_type: "image/jpeg".to_string(),
            data: raw.to_string(),
        }
    }
}

/// Text generation backend contract.
#[async_trait]
pub trait TextGenerator: Send + Sync + std::fmt::Debug {
    /// Generates text for `prompt` with `model`.
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        temperature: Option<f32>,
    ) -> Result<String, GenerateError>;

    /// Generates text for `prompt` grounded on `image`.
    async fn analyze_image(
        &self,
        model: &str,
        prompt: &str,
        image: &InlineImage,
        temperature: Option<f32>,
    ) -> Result<String, GenerateError>;
}
