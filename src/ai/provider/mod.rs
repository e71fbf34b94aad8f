//! Generation Backend Abstraction
//!
//! Defines the `GenerationBackend` trait: one prompt in, one raw reply out.
//! Each adapter owns every backend-specific shape assumption and maps its
//! failures to a classified [`LlmError`], so callers never look at raw
//! responses or transport errors.
//!
//! ## Modules
//!
//! - `gemini`: Google Gemini `generateContent` REST API (default)
//! - `openai`: OpenAI-compatible Chat Completions API

mod gemini;
mod openai;

#[cfg(test)]
pub(crate) mod testing;

pub use gemini::GeminiBackend;
pub use openai::OpenAiBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::types::{FinError, LlmError, Result};

// =============================================================================
// Backend Reply
// =============================================================================

/// Raw reply from a backend, before outcome classification
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendReply {
    /// Generated text, if the backend produced any
    pub text: Option<String>,
    /// Safety block reason reported by the backend
    pub block_reason: Option<String>,
    /// Token usage metrics
    pub usage: TokenUsage,
}

impl BackendReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn blocked(reason: impl Into<String>) -> Self {
        Self {
            block_reason: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Token usage metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input tokens (prompt)
    pub input_tokens: u32,
    /// Output tokens (response)
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Total tokens used (input + output)
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Shared backend type for concurrent access across requests.
pub type SharedBackend = Arc<dyn GenerationBackend>;

// =============================================================================
// Provider Configuration
// =============================================================================

/// Configuration for generation backends
///
/// Note: API keys are never serialized to output and are redacted in debug
/// output. Each backend converts the key to SecretString internally.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Backend type: "gemini", "openai"
    pub provider: String,
    /// Model name (backend-specific)
    pub model: Option<String>,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
    /// Temperature for generation
    pub temperature: f32,
    /// API key (falls back to the backend's conventional env var)
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL (for custom endpoints)
    #[serde(default)]
    pub api_base: Option<String>,
    /// Maximum tokens to generate
    pub max_tokens: u32,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: None,
            timeout_secs: crate::constants::network::DEFAULT_TIMEOUT_SECS,
            temperature: 0.2,
            api_key: None,
            api_base: None,
            max_tokens: 1024,
        }
    }
}

// =============================================================================
// Generation Backend Trait
// =============================================================================

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Send one prompt, return the raw reply or a classified failure
    async fn generate(&self, prompt: &str) -> std::result::Result<BackendReply, LlmError>;

    /// Backend name for logging
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;
}

/// Create a shared backend from configuration
pub fn create_backend(config: &ProviderConfig) -> Result<SharedBackend> {
    match config.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiBackend::new(config.clone())?)),
        "openai" => Ok(Arc::new(OpenAiBackend::new(config.clone())?)),
        _ => Err(FinError::Config(format!(
            "Unknown provider: {}. Supported: gemini, openai",
            config.provider
        ))),
    }
}

/// Validate a backend base URL
///
/// Only http/https schemes are accepted.
pub(crate) fn validate_endpoint(endpoint: &str, provider: &str) -> Result<String> {
    let url = url::Url::parse(endpoint).map_err(|e| {
        FinError::Config(format!("Invalid {} endpoint URL '{}': {}", provider, endpoint, e))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(FinError::Config(format!(
            "{} endpoint must use http or https scheme, got: {}",
            provider,
            url.scheme()
        )));
    }

    Ok(endpoint.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config_debug_redacts_key() {
        let config = ProviderConfig {
            api_key: Some("super-secret".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_provider_config_never_serializes_key() {
        let config = ProviderConfig {
            api_key: Some("super-secret".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("super-secret"));
    }

    #[test]
    fn test_create_backend_rejects_unknown_provider() {
        let config = ProviderConfig {
            provider: "carrier-pigeon".to_string(),
            ..Default::default()
        };
        let err = create_backend(&config).err().unwrap();
        assert!(matches!(err, FinError::Config(_)));
    }

    #[test]
    fn test_validate_endpoint() {
        assert_eq!(
            validate_endpoint("https://example.com/v1/", "openai").unwrap(),
            "https://example.com/v1"
        );
        assert!(validate_endpoint("ftp://example.com", "openai").is_err());
        assert!(validate_endpoint("not a url", "openai").is_err());
    }

    #[test]
    fn test_token_usage_total() {
        assert_eq!(TokenUsage::new(100, 50).total(), 150);
    }
}
