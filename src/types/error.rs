//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//! Backend failures are classified exactly once, at the provider boundary,
//! into an [`ErrorCategory`]; everything downstream routes on the category.
//!
//! ## Error Categories
//!
//! - **RateLimit**: quota exhausted (the only retryable category)
//! - **Auth**: bad or missing API key (fail fast)
//! - **Network**: connectivity issues (fail fast, surfaced to caller)
//! - **Unavailable**: backend down or model missing
//! - **BadRequest**: malformed request
//! - **ParseError**: backend replied with an unexpected shape
//!
//! ## Design Principles
//!
//! - Single unified error type (FinError) for the entire application
//! - Structured error variants with context for better debugging
//! - No panic/unwrap - all errors are recoverable

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Error categories for retry decisions at the model boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited or quota exhausted - wait then retry
    RateLimit,
    /// Authentication failed - fail fast, don't retry
    Auth,
    /// Network/connectivity issues
    Network,
    /// Backend unavailable or model not found
    Unavailable,
    /// Invalid request - don't retry, fix request
    BadRequest,
    /// Backend response could not be parsed
    ParseError,
    /// Unknown error
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::ParseError => write!(f, "PARSE_ERROR"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// Rate limits are the only failures worth retrying; anything else
    /// surfaces immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimit)
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Classified error from a generation backend
#[derive(Debug, Clone)]
pub struct LlmError {
    /// Error category for routing decisions
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
    /// Backend that produced the error
    pub provider: Option<String>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{}:{}] {}", provider, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
        }
    }

    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: Some(provider.into()),
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        self.category == ErrorCategory::RateLimit
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// True if `code` appears as a standalone number, not inside a longer digit run
fn has_status_code(message: &str, code: &str) -> bool {
    let bytes = message.as_bytes();
    message.match_indices(code).any(|(start, _)| {
        let end = start + code.len();
        let digit_before = start > 0 && bytes[start - 1].is_ascii_digit();
        let digit_after = bytes.get(end).is_some_and(u8::is_ascii_digit);
        !digit_before && !digit_after
    })
}

/// Maps backend-specific failure signals onto [`ErrorCategory`]
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an error message from any backend
    pub fn classify(message: &str, provider: &str) -> LlmError {
        let lower = message.to_lowercase();

        // Rate limiting / quota patterns (Gemini reports RESOURCE_EXHAUSTED)
        if lower.contains("rate limit")
            || has_status_code(&lower, "429")
            || lower.contains("too many requests")
            || lower.contains("quota")
            || lower.contains("resource_exhausted")
            || lower.contains("resource exhausted")
        {
            return LlmError::with_provider(ErrorCategory::RateLimit, message, provider);
        }

        // Authentication patterns
        if lower.contains("api key")
            || lower.contains("api_key")
            || has_status_code(&lower, "401")
            || has_status_code(&lower, "403")
            || lower.contains("unauthenticated")
            || lower.contains("unauthorized")
            || lower.contains("permission denied")
            || lower.contains("permission_denied")
        {
            return LlmError::with_provider(ErrorCategory::Auth, message, provider);
        }

        // Network patterns
        if lower.contains("network")
            || lower.contains("connection")
            || lower.contains("dns")
            || lower.contains("timeout")
            || lower.contains("timed out")
            || lower.contains("unreachable")
        {
            return LlmError::with_provider(ErrorCategory::Network, message, provider);
        }

        // Backend unavailable patterns
        if has_status_code(&lower, "503")
            || has_status_code(&lower, "502")
            || has_status_code(&lower, "500")
            || lower.contains("service unavailable")
            || lower.contains("unavailable")
            || lower.contains("internal error")
            || lower.contains("not found")
        {
            return LlmError::with_provider(ErrorCategory::Unavailable, message, provider);
        }

        // Bad request patterns
        if has_status_code(&lower, "400")
            || lower.contains("bad request")
            || lower.contains("invalid_argument")
            || lower.contains("invalid")
            || lower.contains("malformed")
        {
            return LlmError::with_provider(ErrorCategory::BadRequest, message, provider);
        }

        if lower.contains("parse") || lower.contains("json") || lower.contains("decode") {
            return LlmError::with_provider(ErrorCategory::ParseError, message, provider);
        }

        LlmError::with_provider(ErrorCategory::Unknown, message, provider)
    }

    /// Classify HTTP status code directly (more accurate than string matching)
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        match status {
            429 => LlmError::with_provider(ErrorCategory::RateLimit, message, provider),
            401 | 403 => LlmError::with_provider(ErrorCategory::Auth, message, provider),
            400 => LlmError::with_provider(ErrorCategory::BadRequest, message, provider),
            404 | 500 | 502 | 503 | 504 => {
                LlmError::with_provider(ErrorCategory::Unavailable, message, provider)
            }
            _ => Self::classify(message, provider),
        }
    }

    /// Classify a transport error raised by the HTTP client
    pub fn classify_transport(err: &reqwest::Error, provider: &str) -> LlmError {
        if let Some(status) = err.status() {
            return Self::classify_http_status(status.as_u16(), &err.to_string(), provider);
        }
        if err.is_timeout() || err.is_connect() {
            return LlmError::with_provider(ErrorCategory::Network, err.to_string(), provider);
        }
        if err.is_decode() {
            return LlmError::with_provider(ErrorCategory::ParseError, err.to_string(), provider);
        }
        Self::classify(&err.to_string(), provider)
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum FinError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // LLM Errors
    // -------------------------------------------------------------------------
    /// Structured LLM error with category
    #[error("LLM error: {0}")]
    Llm(LlmError),

    /// Operation timeout with context
    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{entity} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Could not validate credentials: {0}")]
    Unauthorized(String),

    #[error("Invalid input: {0}")]
    Validation(String),
}

impl From<LlmError> for FinError {
    fn from(err: LlmError) -> Self {
        FinError::Llm(err)
    }
}

pub type Result<T> = std::result::Result<T, FinError>;

// =============================================================================
// Helper Functions
// =============================================================================

impl FinError {
    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Create an LLM error with category
    pub fn llm_with_category(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self::Llm(LlmError::new(category, message))
    }
}

/// Context extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| FinError::Storage(format!("{}: {}", context.into(), e)))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::RateLimit.to_string(), "RATE_LIMIT");
        assert_eq!(ErrorCategory::Auth.to_string(), "AUTH");
        assert_eq!(ErrorCategory::ParseError.to_string(), "PARSE_ERROR");
    }

    #[test]
    fn test_only_rate_limit_is_retryable() {
        assert!(ErrorCategory::RateLimit.is_retryable());
        assert!(!ErrorCategory::Network.is_retryable());
        assert!(!ErrorCategory::Unavailable.is_retryable());
        assert!(!ErrorCategory::Auth.is_retryable());
        assert!(!ErrorCategory::Unknown.is_retryable());
    }

    #[test]
    fn test_classify_rate_limit() {
        let err = ErrorClassifier::classify("429 Resource has been exhausted", "gemini");
        assert_eq!(err.category, ErrorCategory::RateLimit);
        assert!(err.is_rate_limit());

        let err = ErrorClassifier::classify("RESOURCE_EXHAUSTED: check quota", "gemini");
        assert_eq!(err.category, ErrorCategory::RateLimit);
    }

    #[test]
    fn test_status_codes_match_whole_numbers_only() {
        let err = ErrorClassifier::classify_http_status(418, "teapot, request id 14290", "test");
        assert_eq!(err.category, ErrorCategory::Unknown);

        let err = ErrorClassifier::classify("upstream ref 5001 rejected", "test");
        assert_eq!(err.category, ErrorCategory::Unknown);

        let err = ErrorClassifier::classify("HTTP 429: slow down", "test");
        assert_eq!(err.category, ErrorCategory::RateLimit);

        let err = ErrorClassifier::classify("status=500", "test");
        assert_eq!(err.category, ErrorCategory::Unavailable);

        assert!(has_status_code("429", "429"));
        assert!(!has_status_code("1429", "429"));
        assert!(!has_status_code("4290", "429"));
    }

    #[test]
    fn test_classify_auth() {
        let err = ErrorClassifier::classify("API key not valid. Please pass a valid API key.", "gemini");
        assert_eq!(err.category, ErrorCategory::Auth);
        assert!(!err.is_rate_limit());
    }

    #[test]
    fn test_classify_network() {
        let err = ErrorClassifier::classify("Connection timed out after 30s", "openai");
        assert_eq!(err.category, ErrorCategory::Network);
    }

    #[test]
    fn test_classify_unknown() {
        let err = ErrorClassifier::classify("Something weird happened", "test");
        assert_eq!(err.category, ErrorCategory::Unknown);
    }

    #[test]
    fn test_classify_http_status() {
        let rate_limit = ErrorClassifier::classify_http_status(429, "slow down", "test");
        assert_eq!(rate_limit.category, ErrorCategory::RateLimit);

        let auth = ErrorClassifier::classify_http_status(403, "forbidden", "test");
        assert_eq!(auth.category, ErrorCategory::Auth);

        let server_error = ErrorClassifier::classify_http_status(503, "overloaded", "test");
        assert_eq!(server_error.category, ErrorCategory::Unavailable);

        // Unmapped statuses fall back to message classification
        let quota = ErrorClassifier::classify_http_status(418, "quota exceeded", "test");
        assert_eq!(quota.category, ErrorCategory::RateLimit);
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::with_provider(ErrorCategory::RateLimit, "Too many requests", "gemini");
        assert_eq!(err.to_string(), "[gemini:RATE_LIMIT] Too many requests");

        let err_no_provider = LlmError::new(ErrorCategory::Network, "Connection failed");
        assert_eq!(err_no_provider.to_string(), "[NETWORK] Connection failed");
    }

    #[test]
    fn test_not_found_display() {
        let err = FinError::not_found("Transaction", 42);
        assert_eq!(err.to_string(), "Transaction not found");
    }
}
