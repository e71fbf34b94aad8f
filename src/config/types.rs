//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Secrets (`llm.api_key`, `auth.jwt_secret`) are never serialized and are
//! redacted from `Debug` output.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::ai::{BackoffPolicy, ProviderConfig};
use crate::constants::{context, listing, network, profile, retry, server};
use crate::types::{FinError, Result};

/// Environment variable consulted when `auth.jwt_secret` is unset
pub const JWT_SECRET_ENV: &str = "SUPABASE_JWT_SECRET";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener settings
    pub server: ServerConfig,

    /// SQLite settings
    pub database: DatabaseConfig,

    /// Generation backend settings
    pub llm: LlmConfig,

    /// Rate-limit retry settings
    pub retry: RetryConfig,

    /// Chat answer settings
    pub chat: ChatConfig,

    /// Bearer-token verification settings
    pub auth: AuthConfig,

    /// Profile defaults
    pub profile: ProfileConfig,
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(FinError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(FinError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.llm.max_tokens == 0 {
            return Err(FinError::Config(
                "LLM max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(FinError::Config(
                "Retry max_attempts must be at least 1".to_string(),
            ));
        }

        if self.retry.max_jitter_ms > retry::MAX_JITTER_MS {
            return Err(FinError::Config(format!(
                "Retry max_jitter_ms must be at most {}, got {}",
                retry::MAX_JITTER_MS,
                self.retry.max_jitter_ms
            )));
        }

        if self.chat.request_timeout_secs == 0 {
            return Err(FinError::Config(
                "Chat request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if !(1..=context::MAX_RECENT_TRANSACTIONS).contains(&self.chat.history_limit) {
            return Err(FinError::Config(format!(
                "Chat history_limit must be between 1 and {}, got {}",
                context::MAX_RECENT_TRANSACTIONS,
                self.chat.history_limit
            )));
        }

        if self.database.pool_size == 0 {
            return Err(FinError::Config(
                "Database pool_size must be greater than 0".to_string(),
            ));
        }

        if !self.profile.default_initial_balance.is_finite() {
            return Err(FinError::Config(
                "Profile default_initial_balance must be a finite number".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum request body size in bytes
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: server::DEFAULT_HOST.to_string(),
            port: server::DEFAULT_PORT,
            body_limit_bytes: server::BODY_LIMIT_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Database Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path
    pub path: PathBuf,
    /// Maximum pooled connections
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("fintrack.db"),
            pool_size: 8,
        }
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend: "gemini" or "openai"
    pub provider: String,
    /// Model override (backend default when unset)
    pub model: Option<String>,
    /// HTTP timeout per backend call
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Custom endpoint base URL
    pub api_base: Option<String>,
    /// API key (falls back to the backend's env var)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        let provider = ProviderConfig::default();
        Self {
            provider: provider.provider,
            model: provider.model,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            temperature: provider.temperature,
            max_tokens: provider.max_tokens,
            api_base: None,
            api_key: None,
        }
    }
}

impl LlmConfig {
    /// Convert to the backend factory's configuration
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            provider: self.provider.clone(),
            model: self.model.clone(),
            timeout_secs: self.timeout_secs,
            temperature: self.temperature,
            api_key: self.api_key.clone(),
            api_base: self.api_base.clone(),
            max_tokens: self.max_tokens,
        }
    }
}

// =============================================================================
// Retry Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per model call, first call included
    pub max_attempts: u32,
    /// Delay before the first retry, doubled each retry
    pub base_delay_ms: u64,
    /// Upper bound of the random jitter added to each delay
    pub max_jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: retry::DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: retry::BASE_DELAY_MS,
            max_jitter_ms: retry::MAX_JITTER_MS,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(self.max_attempts, Duration::from_millis(self.base_delay_ms))
            .with_max_jitter(Duration::from_millis(self.max_jitter_ms))
    }
}

// =============================================================================
// Chat Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Ceiling for one whole assistant call, backoff included
    pub request_timeout_secs: u64,
    /// Transactions included in the chat context
    pub history_limit: usize,
    /// Extra instructions appended to the advisor preamble
    pub guidance: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: network::ASSISTANT_TIMEOUT_SECS,
            history_limit: context::MAX_RECENT_TRANSACTIONS,
            guidance: String::new(),
        }
    }
}

impl ChatConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// =============================================================================
// Auth Configuration
// =============================================================================

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret shared with the identity provider
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl AuthConfig {
    /// Configured secret, falling back to the identity provider's env var
    pub fn secret(&self) -> Option<SecretString> {
        self.jwt_secret
            .clone()
            .or_else(|| std::env::var(JWT_SECRET_ENV).ok())
            .filter(|s| !s.trim().is_empty())
            .map(SecretString::from)
    }
}

// =============================================================================
// Profile & Listing Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Balance given to a profile created on first access
    pub default_initial_balance: f64,
    /// Default page size for transaction listing
    pub default_page_size: u32,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            default_initial_balance: profile::DEFAULT_INITIAL_BALANCE,
            default_page_size: listing::DEFAULT_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.chat.history_limit, 20);
        assert_eq!(config.profile.default_initial_balance, 5000.0);
    }

    #[test]
    fn test_retry_policy_from_config() {
        let retry = RetryConfig {
            max_attempts: 5,
            base_delay_ms: 250,
            max_jitter_ms: 0,
        };
        let policy = retry.policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.next_delay(2), Duration::from_secs(1));
    }

    #[test]
    fn test_jitter_bound_is_inclusive_at_one_second() {
        let mut config = Config::default();
        config.retry.max_jitter_ms = 1_000;
        config.validate().unwrap();

        config.retry.max_jitter_ms = 1_001;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, FinError::Config(msg) if msg.contains("max_jitter_ms")));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.llm.temperature = 3.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.retry.max_jitter_ms = 5_000;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.chat.history_limit = 50;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.profile.default_initial_balance = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_secrets_never_leak() {
        let mut config = Config::default();
        config.llm.api_key = Some("llm-secret".to_string());
        config.auth.jwt_secret = Some("jwt-secret".to_string());

        let debug = format!("{:?}", config);
        assert!(!debug.contains("llm-secret"));
        assert!(!debug.contains("jwt-secret"));

        let toml = toml::to_string(&config).unwrap();
        assert!(!toml.contains("llm-secret"));
        assert!(!toml.contains("jwt-secret"));
    }

    #[test]
    fn test_provider_config_carries_key() {
        let mut llm = LlmConfig::default();
        llm.api_key = Some("k".to_string());
        llm.model = Some("gemini-2.0-flash".to_string());
        let provider = llm.provider_config();
        assert_eq!(provider.api_key.as_deref(), Some("k"));
        assert_eq!(provider.model.as_deref(), Some("gemini-2.0-flash"));
    }
}
