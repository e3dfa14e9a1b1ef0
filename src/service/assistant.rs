//! Listing assistant: risk assessment, price and description suggestions,
//! and image analysis on top of a [`TextGenerator`].
//!
//! Every call walks the configured model list in order. A model the
//! backend does not know is skipped; any other failure ends the call.
//! Model output is reduced to its first JSON object before parsing.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ai::{GenerateError, InlineImage, TextGenerator};
use crate::error::MarketError;

/// Substrings that block a listing before any model call.
pub const CRITICAL_KEYWORDS: [&str; 6] = [
    "free gift card",
    "paypal only",
    "western union",
    "bitcoin",
    "counterfeit",
    "replica",
];

/// Substrings that add a warning flag without blocking.
pub const WARNING_KEYWORDS: [&str; 4] = ["urgent", "limited time", "exclusive", "rare"];

/// Descriptions shorter than this many characters are blocked.
pub const MIN_DESCRIPTION_CHARS: usize = 20;

/// Prices strictly between zero and this value get a warning flag unless
/// the item is sold as used or junk.
pub const LOW_PRICE_THRESHOLD: f64 = 500.0;

const RISK_TEMPERATURE: f32 = 0.2;
const ANALYZE_TEMPERATURE: f32 = 0.4;

const DEFAULT_ANALYZE_PROMPT: &str = "You are a marketplace lister. Analyze the image and return JSON \
with keys: title (<=40 chars), category (broad category name), conditionComment (short condition \
note). Return ONLY JSON.";

/// Listing submitted for risk assessment.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessmentRequest {
    /// Listing title.
    pub title: String,
    /// Listing description.
    pub description: String,
    /// Image URLs (preferred).
    #[serde(default)]
    pub images: Vec<String>,
    /// Image URLs (used when `images` is empty).
    #[serde(default)]
    pub image_urls: Vec<String>,
    /// Category code or label.
    #[serde(default)]
    pub category: String,
    /// Asking price.
    #[serde(default)]
    pub price: f64,
    /// Condition label.
    #[serde(default)]
    pub condition: String,
}

impl RiskAssessmentRequest {
    fn image_list(&self) -> &[String] {
        if self.images.is_empty() {
            &self.image_urls
        } else {
            &self.images
        }
    }

    fn haystack(&self) -> String {
        format!("{} {}", self.title, self.description).to_lowercase()
    }
}

/// Risk verdict. Sub-scores run 0..=100 where higher means riskier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskAssessment {
    /// Overall risk in `0.0..=1.0`.
    pub risk_score: f64,
    /// Summary.
    pub reason: String,
    /// Concerns found.
    pub flags: Vec<String>,
    /// Image/title mismatch score.
    pub image_mismatch_score: i64,
    /// Why the images do or do not match.
    pub image_mismatch_reason: String,
    /// Title the model derived from the images.
    pub reconstructed_image_title: String,
    /// Lack-of-clarity score.
    pub clarity_score: i64,
    /// Clarity rationale.
    pub clarity_reason: String,
    /// Inauthenticity score.
    pub authenticity_score: i64,
    /// Authenticity rationale.
    pub authenticity_reason: String,
    /// Description the model derived from the listing.
    pub reconstructed_description: String,
    /// Category misfit score.
    pub category_fit_score: i64,
    /// Category rationale.
    pub category_reason: String,
}

impl RiskAssessment {
    /// Verdict returned without a model call when the pre-filter trips.
    #[must_use]
    pub fn blocked() -> Self {
        Self {
            risk_score: 0.95,
            reason: "assessment stopped: critical risk detected".to_string(),
            flags: vec!["high-risk keyword or extremely short description".to_string()],
            image_mismatch_score: 95,
            image_mismatch_reason: "not assessable".to_string(),
            reconstructed_image_title: String::new(),
            clarity_score: 90,
            clarity_reason: "description is insufficient".to_string(),
            authenticity_score: 95,
            authenticity_reason: "credibility is extremely low".to_string(),
            reconstructed_description: String::new(),
            category_fit_score: 95,
            category_reason: "assessment stopped".to_string(),
        }
    }
}

/// Item facts used by the suggestion prompts.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    /// Listing title.
    pub title: String,
    /// Condition label.
    pub condition: String,
    /// Category code or label.
    pub category: String,
    /// Current description, if any.
    #[serde(default)]
    pub description: String,
}

impl SuggestionRequest {
    fn validate(&self) -> Result<(), MarketError> {
        for (field, value) in [
            ("title", &self.title),
            ("condition", &self.condition),
            ("category", &self.category),
        ] {
            if value.trim().is_empty() {
                return Err(MarketError::InvalidRequest(format!("{field} is required")));
            }
        }
        Ok(())
    }
}

/// Suggested price band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PriceRange {
    /// Lowest reasonable price.
    pub min: i64,
    /// Highest reasonable price.
    pub max: i64,
}

/// Price suggestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PriceSuggestion {
    /// Recommended asking price.
    pub suggested_price: i64,
    /// Why.
    pub reasoning: String,
    /// Reasonable band around the recommendation.
    pub price_range: PriceRange,
}

/// Description suggestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct DescriptionSuggestion {
    /// Proposed description.
    pub description: String,
    /// Selling points.
    pub highlights: Vec<String>,
}

/// Image analysis result. Only `raw` is set when the model did not answer
/// with the expected object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnalysis {
    /// Proposed title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Proposed broad category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Short condition note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_comment: Option<String>,
    /// Unprocessed model output.
    pub raw: String,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AnalysisFields {
    title: String,
    category: String,
    condition_comment: String,
}

/// Runs the listing assistant against an optional backend.
#[derive(Debug, Clone)]
pub struct AssistantService {
    generator: Option<Arc<dyn TextGenerator>>,
    models: Vec<String>,
}

impl AssistantService {
    /// Creates a new `AssistantService`. Without a generator every call
    /// answers [`MarketError::AiUnavailable`].
    #[must_use]
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, models: Vec<String>) -> Self {
        Self { generator, models }
    }

    /// Whether a backend is wired in.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    /// Scores a listing for fraud risk.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidRequest`] for a blank title,
    /// [`MarketError::AiUnavailable`] without a backend,
    /// [`MarketError::AiUpstream`] when no model answers and
    /// [`MarketError::AiResponse`] when the answer is not the expected JSON.
    pub async fn assess_risk(&self, req: &RiskAssessmentRequest) -> Result<RiskAssessment, MarketError> {
        if req.title.trim().is_empty() {
            return Err(MarketError::InvalidRequest("title is required".to_string()));
        }
        self.backend()?;
        if should_block(req) {
            tracing::info!(title = %req.title, "risk pre-filter blocked listing");
            return Ok(RiskAssessment::blocked());
        }

        let text = self.run(&risk_prompt(req), None, Some(RISK_TEMPERATURE)).await?;
        let mut assessment: RiskAssessment = parse_json(&text)?;
        for flag in warning_flags(req) {
            if !assessment.flags.contains(&flag) {
                assessment.flags.push(flag);
            }
        }
        Ok(assessment)
    }

    /// Suggests an asking price.
    ///
    /// # Errors
    ///
    /// Same as [`AssistantService::assess_risk`], with
    /// [`MarketError::InvalidRequest`] for a missing title, condition or
    /// category.
    pub async fn suggest_price(&self, req: &SuggestionRequest) -> Result<PriceSuggestion, MarketError> {
        req.validate()?;
        let prompt = format!(
            "You are a pricing expert for a second-hand marketplace.\n\n\
             Suggest a fair asking price in JPY for this item.\n\n\
             Title: {}\nCategory: {}\nCondition: {}\nDescription: {}\n\n\
             Answer with this JSON:\n\
             {{\"suggestedPrice\": number, \"reasoning\": \"why, at most 100 characters\", \
             \"priceRange\": {{\"min\": number, \"max\": number}}}}\n\n\
             Rules: no code fences, no text before or after, start with {{ and end with }}, \
             keep the key names and types exactly.",
            req.title, req.category, req.condition, req.description
        );
        let text = self.run(&prompt, None, None).await?;
        parse_json(&text)
    }

    /// Writes a selling description.
    ///
    /// # Errors
    ///
    /// Same as [`AssistantService::suggest_price`].
    pub async fn suggest_description(
        &self,
        req: &SuggestionRequest,
    ) -> Result<DescriptionSuggestion, MarketError> {
        req.validate()?;
        let prompt = format!(
            "You are a copywriter for a second-hand marketplace.\n\n\
             Write an appealing description for this item.\n\n\
             Title: {}\nCategory: {}\nCondition: {}\nCurrent description: {}\n\n\
             Answer with this JSON:\n\
             {{\"description\": \"200 to 300 characters\", \"highlights\": [\"point 1\", \"point 2\", \"point 3\"]}}\n\n\
             Rules: no code fences, no text before or after, pure JSON only, \
             keep the key names and types exactly.",
            req.title, req.category, req.condition, req.description
        );
        let text = self.run(&prompt, None, None).await?;
        parse_json(&text)
    }

    /// Proposes listing fields from a photo.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidRequest`] for an empty image,
    /// [`MarketError::AiUnavailable`] without a backend and
    /// [`MarketError::AiUpstream`] when no model answers.
    pub async fn analyze_image(
        &self,
        image_base64: &str,
        prompt: Option<&str>,
    ) -> Result<ImageAnalysis, MarketError> {
        let image = InlineImage::from_base64(image_base64);
        if image.data.is_empty() {
            return Err(MarketError::InvalidRequest("imageBase64 is required".to_string()));
        }
        let prompt = prompt
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_ANALYZE_PROMPT);

        let raw = self.run(prompt, Some(&image), Some(ANALYZE_TEMPERATURE)).await?;
        match serde_json::from_str::<AnalysisFields>(extract_json(&raw)) {
            Ok(fields) if !fields.title.is_empty() => Ok(ImageAnalysis {
                title: Some(fields.title),
                category: Some(fields.category),
                condition_comment: Some(fields.condition_comment),
                raw,
            }),
            _ => Ok(ImageAnalysis {
                raw,
                ..ImageAnalysis::default()
            }),
        }
    }

    fn backend(&self) -> Result<&Arc<dyn TextGenerator>, MarketError> {
        self.generator.as_ref().ok_or(MarketError::AiUnavailable)
    }

    /// Tries each model in order until one answers.
    async fn run(
        &self,
        prompt: &str,
        image: Option<&InlineImage>,
        temperature: Option<f32>,
    ) -> Result<String, MarketError> {
        let backend = self.backend()?;
        tracing::debug!(prompt, "assistant prompt");

        for (attempt, model) in self.models.iter().enumerate() {
            tracing::debug!(model = %model, attempt, "trying model");
            let result = match image {
                Some(image) => backend.analyze_image(model, prompt, image, temperature).await,
                None => backend.generate(model, prompt, temperature).await,
            };
            match result {
                Ok(text) => {
                    if attempt > 0 {
                        tracing::info!(model = %model, "fallback model used");
                    }
                    tracing::debug!(response = %text, "assistant response");
                    return Ok(text);
                }
                Err(GenerateError::ModelNotFound(_)) => {
                    tracing::warn!(model = %model, "model not found, trying next");
                }
                Err(GenerateError::Upstream(e)) => {
                    tracing::error!(model = %model, error = %e, "generation failed");
                    return Err(MarketError::AiUpstream(e));
                }
            }
        }
        Err(MarketError::AiUpstream("no configured model is available".to_string()))
    }
}

/// Blocks listings with critical keywords or a near-empty description.
#[must_use]
pub fn should_block(req: &RiskAssessmentRequest) -> bool {
    let text = req.haystack();
    CRITICAL_KEYWORDS.iter().any(|kw| text.contains(kw))
        || req.description.trim().chars().count() < MIN_DESCRIPTION_CHARS
}

/// Non-blocking warnings appended to a model verdict.
#[must_use]
pub fn warning_flags(req: &RiskAssessmentRequest) -> Vec<String> {
    let text = req.haystack();
    let mut flags: Vec<String> = WARNING_KEYWORDS
        .iter()
        .filter(|kw| text.contains(*kw))
        .map(|kw| format!("warning keyword: {kw}"))
        .collect();

    let condition = req.condition.trim().to_lowercase();
    let worn = matches!(condition.as_str(), "used" | "junk" | "中古" | "ジャンク");
    if req.price > 0.0 && req.price < LOW_PRICE_THRESHOLD && !worn {
        flags.push("price is unusually low".to_string());
    }
    flags
}

/// Drops code fences and returns the span from the first `{` to the last
/// `}`, or the fence-free text when there is no such span.
#[must_use]
pub fn extract_json(text: &str) -> &str {
    let start = text.find('{');
    let end = text.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if end > start => text.get(start..=end).unwrap_or(text).trim(),
        _ => strip_fences(text),
    }
}

fn strip_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, MarketError> {
    serde_json::from_str(extract_json(text)).map_err(|e| {
        tracing::error!(error = %e, response = %text, "unparseable ai response");
        MarketError::AiResponse(e.to_string())
    })
}

fn risk_prompt(req: &RiskAssessmentRequest) -> String {
    let images = req.image_list();
    let image_list = if images.is_empty() {
        "none".to_string()
    } else {
        images.join(", ")
    };
    format!(
        r#"You are a fraud detection specialist for a second-hand marketplace. Analyse the listing strictly and return only the JSON below. No code fences, no extra text.

[Listing]
Title: {title}
Description: {description}
Category: {category}
Price: {price:.2} JPY
Condition: {condition}
Image URLs: {image_list}

[Scoring] Every score is 0-100, lower means less risk. Score strictly.

1) clarityScore: 0-20 very detailed and specific, 21-40 enough information, 41-60 bare minimum, 61-80 vague, 81-100 almost no information. Put a 20-40 character reason in clarityReason.
2) authenticityScore: first restate the listing in 20-60 characters as reconstructedDescription. 0-20 fully consistent and honest, 21-40 small exaggerations, 41-60 noticeable exaggeration, 61-80 clear contradictions, 81-100 false or likely fraud. Reason in authenticityReason.
3) categoryFitScore: 0-20 exact fit, 21-40 mostly fits, 41-60 somewhat off, 61-80 clear mismatch, 81-100 deliberate misclassification. Reason in categoryReason.
4) imageMismatchScore: read the images and write a 20-40 character title as reconstructedImageTitle. 0-20 images match, 21-40 mostly match, 41-60 somewhat off or no images, 61-80 clear mismatch, 81-100 unrelated or fraudulent. Use 50 when there are no image URLs. Reason in imageMismatchReason.
5) riskScore (0.0-1.0): base = (clarityScore + authenticityScore + categoryFitScore + imageMismatchScore) / 250. Adjust within +/-0.2: abnormal price +0.1 to +0.2, illogical description +0.1, urgency pressure +0.1, prohibited words +0.2, nothing notable -0.05 to 0. Clamp to 0.0-1.0. Summarise in reason (30-60 characters). List at most 5 concerns in flags, each at most 20 characters.

Output JSON (exactly these keys):
{{"riskScore": number, "reason": "string", "flags": ["string"], "imageMismatchScore": int, "imageMismatchReason": "string", "reconstructedImageTitle": "string", "clarityScore": int, "clarityReason": "string", "authenticityScore": int, "authenticityReason": "string", "reconstructedDescription": "string", "categoryFitScore": int, "categoryReason": "string"}}"#,
        title = req.title,
        description = req.description,
        category = req.category,
        price = req.price,
        condition = req.condition,
    )
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers with a fixed text, failing models listed in `missing`.
    #[derive(Debug, Default)]
    struct StubGenerator {
        reply: String,
        missing: Vec<String>,
        upstream_failure: bool,
        calls: Mutex<Vec<String>>,
    }

    impl StubGenerator {
        fn replying(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }

        fn answer(&self, model: &str) -> Result<String, GenerateError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(model.to_string());
            }
            if self.missing.iter().any(|m| m == model) {
                return Err(GenerateError::ModelNotFound(model.to_string()));
            }
            if self.upstream_failure {
                return Err(GenerateError::Upstream("quota exceeded".to_string()));
            }
            Ok(self.reply.clone())
        }
    }

    #[async_trait]
    impl TextGenerator for StubGenerator {
        async fn generate(&self, model: &str, _: &str, _: Option<f32>) -> Result<String, GenerateError> {
            self.answer(model)
        }

        async fn analyze_image(
            &self,
            model: &str,
            _: &str,
            _: &InlineImage,
            _: Option<f32>,
        ) -> Result<String, GenerateError> {
            self.answer(model)
        }
    }

    fn models() -> Vec<String> {
        vec!["m1".to_string(), "m2".to_string()]
    }

    fn service(stub: &Arc<StubGenerator>) -> AssistantService {
        let generator: Arc<dyn TextGenerator> = Arc::clone(stub) as Arc<dyn TextGenerator>;
        AssistantService::new(Some(generator), models())
    }

    fn listing(title: &str, description: &str) -> RiskAssessmentRequest {
        RiskAssessmentRequest {
            title: title.to_string(),
            description: description.to_string(),
            price: 12_000.0,
            condition: "like new".to_string(),
            ..RiskAssessmentRequest::default()
        }
    }

    const VERDICT: &str = r#"```json
{"riskScore": 0.3, "reason": "looks fine", "flags": ["minor"], "clarityScore": 20,
 "authenticityScore": 20, "categoryFitScore": 20, "imageMismatchScore": 15}
```"#;

    #[test]
    fn extract_json_strips_fences_and_prose() {
        assert_eq!(extract_json("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(extract_json("Sure! {\"a\": {\"b\": 2}} hope it helps"), "{\"a\": {\"b\": 2}}");
        assert_eq!(extract_json("```\nno json here\n```"), "no json here");
    }

    #[test]
    fn pre_filter_catches_keywords_and_short_descriptions() {
        assert!(should_block(&listing("Gift", "Pay with Bitcoin only, shipped the same day")));
        assert!(should_block(&listing("Rolex REPLICA", "Looks exactly like the real thing, great watch")));
        assert!(should_block(&listing("Watch", "Nice watch.")));
        assert!(!should_block(&listing("Watch", "Seiko automatic, serviced in 2023, minor scratches")));
    }

    #[test]
    fn short_description_is_measured_in_characters() {
        // 20 multi-byte characters pass the length check.
        let description = "あ".repeat(MIN_DESCRIPTION_CHARS);
        assert!(!should_block(&listing("Vase", &description)));
    }

    #[test]
    fn warning_flags_cover_keywords_and_low_price() {
        let mut req = listing("Rare card", "URGENT sale, limited time offer for this card");
        req.price = 300.0;
        let flags = warning_flags(&req);
        assert_eq!(flags.len(), 4);
        req.condition = "junk".to_string();
        assert_eq!(warning_flags(&req).len(), 3);
    }

    #[tokio::test]
    async fn blocked_listing_skips_the_model() {
        let stub = Arc::new(StubGenerator::replying(VERDICT));
        let svc = service(&stub);
        let Ok(verdict) = svc.assess_risk(&listing("Card", "western union please")).await else {
            panic!("assessment failed");
        };
        assert_eq!(verdict, RiskAssessment::blocked());
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn model_verdict_gets_warning_flags() {
        let stub = Arc::new(StubGenerator::replying(VERDICT));
        let svc = service(&stub);
        let req = listing("Rare stamp", "Mint condition stamp from 1964, kept in an album");
        let Ok(verdict) = svc.assess_risk(&req).await else {
            panic!("assessment failed");
        };
        assert!((verdict.risk_score - 0.3).abs() < f64::EPSILON);
        assert_eq!(verdict.flags, ["minor", "warning keyword: rare"]);
        assert_eq!(stub.calls(), ["m1"]);
    }

    #[tokio::test]
    async fn falls_back_only_on_missing_models() {
        let stub = Arc::new(StubGenerator {
            reply: r#"{"suggestedPrice": 4500, "reasoning": "market", "priceRange": {"min": 4000, "max": 5000}}"#
                .to_string(),
            missing: vec!["m1".to_string()],
            ..StubGenerator::default()
        });
        let svc = service(&stub);
        let req = SuggestionRequest {
            title: "Desk lamp".to_string(),
            condition: "used".to_string(),
            category: "300".to_string(),
            description: String::new(),
        };
        let Ok(price) = svc.suggest_price(&req).await else {
            panic!("suggestion failed");
        };
        assert_eq!(price.suggested_price, 4500);
        assert_eq!(price.price_range, PriceRange { min: 4000, max: 5000 });
        assert_eq!(stub.calls(), ["m1", "m2"]);
    }

    #[tokio::test]
    async fn upstream_failure_stops_the_chain() {
        let stub = Arc::new(StubGenerator {
            upstream_failure: true,
            ..StubGenerator::default()
        });
        let svc = service(&stub);
        let req = SuggestionRequest {
            title: "Lamp".to_string(),
            condition: "used".to_string(),
            category: "300".to_string(),
            description: String::new(),
        };
        assert!(matches!(svc.suggest_description(&req).await, Err(MarketError::AiUpstream(_))));
        assert_eq!(stub.calls(), ["m1"]);
    }

    #[tokio::test]
    async fn all_models_missing_is_upstream_error() {
        let stub = Arc::new(StubGenerator {
            missing: models(),
            ..StubGenerator::default()
        });
        let svc = service(&stub);
        let req = listing("Stamp", "Mint condition stamp from 1964, kept in an album");
        assert!(matches!(svc.assess_risk(&req).await, Err(MarketError::AiUpstream(_))));
    }

    #[tokio::test]
    async fn unparseable_answer_is_a_hard_error() {
        let stub = Arc::new(StubGenerator::replying("I cannot help with that."));
        let svc = service(&stub);
        let req = listing("Stamp", "Mint condition stamp from 1964, kept in an album");
        assert!(matches!(svc.assess_risk(&req).await, Err(MarketError::AiResponse(_))));
    }

    #[tokio::test]
    async fn missing_backend_is_unavailable() {
        let svc = AssistantService::new(None, models());
        assert!(!svc.is_configured());
        let req = listing("Stamp", "short");
        assert!(matches!(svc.assess_risk(&req).await, Err(MarketError::AiUnavailable)));
    }

    #[tokio::test]
    async fn image_analysis_falls_back_to_raw_text() {
        let stub = Arc::new(StubGenerator::replying(
            r#"{"title": "Film camera", "category": "Cameras", "conditionComment": "light wear"}"#,
        ));
        let svc = service(&stub);
        let Ok(parsed) = svc.analyze_image("data:image/png;base64,AAAA", None).await else {
            panic!("analysis failed");
        };
        assert_eq!(parsed.title.as_deref(), Some("Film camera"));

        let stub = Arc::new(StubGenerator::replying("A camera on a table."));
        let svc = service(&stub);
        let Ok(raw) = svc.analyze_image("AAAA", Some("describe")).await else {
            panic!("analysis failed");
        };
        assert_eq!(raw.title, None);
        assert_eq!(raw.raw, "A camera on a table.");
        assert!(matches!(
            svc.analyze_image("data:image/png;base64,", None).await,
            Err(MarketError::InvalidRequest(_))
        ));
    }
}
