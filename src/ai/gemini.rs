//! [`TextGenerator`] over the Generative Language REST API
//! (`models/{model}:generateContent`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{GenerateError, InlineImage, TextGenerator};

/// HTTP client for Gemini models.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    /// Creates a client whose calls give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend cannot be initialised.
    pub fn new(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn generate_content(
        &self,
        model: &str,
        parts: Vec<Part>,
        temperature: Option<f32>,
    ) -> Result<String, GenerateError> {
        let url = format!("{}/models/{model}:generateContent", self.base_url);
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts,
            }],
            generation_config: temperature.map(|temperature| GenerationConfig { temperature }),
        };

        tracing::debug!(model, "calling generateContent");
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerateError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(classify_failure(model, status, &detail));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::Upstream(format!("malformed response: {e}")))?;
        Ok(parsed.text())
    }
}

/// Maps a non-2xx answer onto [`GenerateError`]. Unknown models come back
/// as 404 or with "not found" in the message.
fn classify_failure(model: &str, status: StatusCode, detail: &str) -> GenerateError {
    if status == StatusCode::NOT_FOUND || detail.to_lowercase().contains("not found") {
        GenerateError::ModelNotFound(model.to_string())
    } else {
        GenerateError::Upstream(format!("{status}: {detail}"))
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        temperature: Option<f32>,
    ) -> Result<String, GenerateError> {
        self.generate_content(model, vec![Part::text(prompt)], temperature)
            .await
    }

    async fn analyze_image(
        &self,
        model: &str,
        prompt: &str,
        image: &InlineImage,
        temperature: Option<f32>,
    ) -> Result<String, GenerateError> {
        let parts = vec![
            Part::text(prompt),
            Part {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                }),
            },
        ];
        self.generate_content(model, parts, temperature).await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(prompt: &str) -> Self {
        Self {
            text: Some(prompt.to_string()),
            inline_data: None,
        }
    }
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateContentResponse {
    /// Text parts of the first candidate, concatenated.
    fn text(&self) -> String {
        self.candidates
            .first()
            .map(|c| c.content.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn first_candidate_parts_are_concatenated() {
        let raw = r#"{"candidates":[
            {"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}]}},
            {"content":{"parts":[{"text":"ignored"}]}}
        ]}"#;
        let Ok(parsed) = serde_json::from_str::<GenerateContentResponse>(raw) else {
            panic!("response should parse");
        };
        assert_eq!(parsed.text(), r#"{"a":1}"#);
    }

    #[test]
    fn empty_response_yields_empty_text() {
        let Ok(parsed) = serde_json::from_str::<GenerateContentResponse>("{}") else {
            panic!("response should parse");
        };
        assert!(parsed.text().is_empty());
    }

    #[test]
    fn unknown_model_is_classified_for_fallback() {
        assert_eq!(
            classify_failure("m1", StatusCode::NOT_FOUND, ""),
            GenerateError::ModelNotFound("m1".to_string())
        );
        assert_eq!(
            classify_failure("m1", StatusCode::BAD_REQUEST, "Publisher model was not found"),
            GenerateError::ModelNotFound("m1".to_string())
        );
        assert!(matches!(
            classify_failure("m1", StatusCode::TOO_MANY_REQUESTS, "quota"),
            GenerateError::Upstream(_)
        ));
    }

    #[test]
    fn request_body_uses_wire_names() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part::text("hi")],
            }],
            generation_config: Some(GenerationConfig { temperature: 0.5 }),
        };
        let Ok(json) = serde_json::to_value(&body) else {
            panic!("body should serialize");
        };
        assert_eq!(json["generationConfig"]["temperature"], 0.5);
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert!(json["contents"][0]["parts"][0].get("inline_data").is_none());
    }
}
