//! Google Gemini Backend
//!
//! Generation backend using the Gemini `generateContent` REST API.
//! All knowledge of the Gemini response shape (candidates, parts,
//! prompt feedback, finish reasons) lives in [`parse_reply`].

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

use super::{BackendReply, GenerationBackend, ProviderConfig, TokenUsage, validate_endpoint};
use crate::types::{ErrorCategory, ErrorClassifier, FinError, LlmError, Result};

const PROVIDER: &str = "gemini";
const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-flash-latest";
const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Finish reasons that mean the candidate was withheld by content policy
const SAFETY_FINISH_REASONS: &[&str] = &["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

/// Gemini backend with secure API key handling
pub struct GeminiBackend {
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl GeminiBackend {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key_str = config
            .api_key
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                FinError::Config(format!(
                    "Gemini API key not found. Set {} env var or llm.api_key in config",
                    API_KEY_ENV
                ))
            })?;

        let api_base = validate_endpoint(
            config.api_base.as_deref().unwrap_or(DEFAULT_API_BASE),
            PROVIDER,
        )?;

        let model = config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FinError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: SecretString::from(api_key_str),
            api_base,
            model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }

    fn build_request(&self, prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_tokens,
            },
        }
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn generate(&self, prompt: &str) -> std::result::Result<BackendReply, LlmError> {
        let start_time = Instant::now();
        let url = format!("{}/models/{}:generateContent", self.api_base, self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&self.build_request(prompt))
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, PROVIDER))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error_body(status.as_u16(), &body));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, PROVIDER))?;

        let reply = parse_reply(body);
        debug!(
            model = %self.model,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            input_tokens = reply.usage.input_tokens,
            output_tokens = reply.usage.output_tokens,
            has_text = reply.text.is_some(),
            "Gemini reply received"
        );
        Ok(reply)
    }

    fn name(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Map a Gemini response body onto a [`BackendReply`]
pub(crate) fn parse_reply(body: GenerateContentResponse) -> BackendReply {
    let usage = body
        .usage_metadata
        .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count))
        .unwrap_or_default();

    let candidate = body.candidates.into_iter().next();

    let text = candidate
        .as_ref()
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<String>()
        })
        .filter(|t| !t.trim().is_empty());

    let block_reason = body
        .prompt_feedback
        .and_then(|f| f.block_reason)
        .or_else(|| {
            candidate
                .and_then(|c| c.finish_reason)
                .filter(|r| SAFETY_FINISH_REASONS.contains(&r.as_str()))
        });

    BackendReply {
        text,
        block_reason,
        usage,
    }
}

/// Classify a non-2xx Gemini response
pub(crate) fn classify_error_body(status: u16, body: &str) -> LlmError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if envelope.error.status.as_deref() == Some("RESOURCE_EXHAUSTED") => {
            LlmError::with_provider(ErrorCategory::RateLimit, envelope.error.message, PROVIDER)
        }
        Ok(envelope) => ErrorClassifier::classify_http_status(
            status,
            &format!("Gemini API error ({}): {}", status, envelope.error.message),
            PROVIDER,
        ),
        Err(_) => ErrorClassifier::classify_http_status(
            status,
            &format!("Gemini API error ({}): {}", status, body),
            PROVIDER,
        ),
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> BackendReply {
        parse_reply(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_parse_text_reply() {
        let reply = parse(
            r#"{
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Food"}, {"text": "\n"}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 42, "candidatesTokenCount": 1}
            }"#,
        );
        assert_eq!(reply.text.as_deref(), Some("Food\n"));
        assert_eq!(reply.block_reason, None);
        assert_eq!(reply.usage, TokenUsage::new(42, 1));
    }

    #[test]
    fn test_parse_prompt_blocked() {
        let reply = parse(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#);
        assert_eq!(reply.text, None);
        assert_eq!(reply.block_reason.as_deref(), Some("SAFETY"));
    }

    #[test]
    fn test_parse_candidate_finished_for_safety() {
        let reply = parse(r#"{"candidates": [{"finishReason": "PROHIBITED_CONTENT"}]}"#);
        assert_eq!(reply.text, None);
        assert_eq!(reply.block_reason.as_deref(), Some("PROHIBITED_CONTENT"));
    }

    #[test]
    fn test_parse_empty_reply() {
        let reply = parse(r#"{"candidates": [{"content": {"parts": [{"text": "   "}]}, "finishReason": "MAX_TOKENS"}]}"#);
        assert_eq!(reply.text, None);
        assert_eq!(reply.block_reason, None);

        assert_eq!(parse("{}"), BackendReply::empty());
    }

    #[test]
    fn test_classify_resource_exhausted() {
        let body = r#"{"error": {"code": 429, "message": "Resource has been exhausted (e.g. check quota).", "status": "RESOURCE_EXHAUSTED"}}"#;
        let err = classify_error_body(429, body);
        assert_eq!(err.category, ErrorCategory::RateLimit);
        assert_eq!(err.provider.as_deref(), Some("gemini"));
    }

    #[test]
    fn test_classify_invalid_key() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}}"#;
        let err = classify_error_body(400, body);
        assert_eq!(err.category, ErrorCategory::BadRequest);
    }

    #[test]
    fn test_classify_unparseable_body() {
        let err = classify_error_body(503, "<html>overloaded</html>");
        assert_eq!(err.category, ErrorCategory::Unavailable);
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let backend = GeminiBackend::new(ProviderConfig {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        })
        .unwrap();
        let json = serde_json::to_value(backend.build_request("hello")).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert!(json["generationConfig"]["maxOutputTokens"].is_number());
        assert!(!format!("{:?}", backend).contains("test-key"));
    }
}
