//! Model Invoker
//!
//! Wraps a single generation call with bounded retries.
//!
//! ## Strategy
//!
//! 1. Call the backend with the prompt
//! 2. Classify the reply: text → `Success`, safety block → `SafetyBlocked`,
//!    nothing → `EmptyResponse` (all terminal)
//! 3. On a rate-limit failure, back off and retry while attempts remain
//! 4. Any other failure is terminal and surfaces as `Failure`
//!
//! The invoker keeps no mutable state, so one instance can serve any number
//! of concurrent requests. Backoff sleeps suspend only the calling task.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use super::backoff::BackoffPolicy;
use super::provider::{BackendReply, SharedBackend};
use crate::types::{ErrorCategory, FinError, LlmError, Result};

// =============================================================================
// Outcomes
// =============================================================================

/// Classified result of an invocation
#[derive(Debug, Clone)]
pub enum GenerationOutcome {
    /// Non-empty, trimmed generated text
    Success(String),
    /// Backend kept rate-limiting until the attempt budget ran out
    RateLimited { after_attempts: u32 },
    /// Backend answered with no content and no safety signal
    EmptyResponse,
    /// Backend withheld content for policy reasons
    SafetyBlocked { reason: String },
    /// Any other backend failure
    Failure(LlmError),
}

/// Variant tag of a [`GenerationOutcome`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    RateLimited,
    EmptyResponse,
    SafetyBlocked,
    Failure,
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::RateLimited => write!(f, "rate_limited"),
            Self::EmptyResponse => write!(f, "empty_response"),
            Self::SafetyBlocked => write!(f, "safety_blocked"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

impl GenerationOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Success(_) => OutcomeKind::Success,
            Self::RateLimited { .. } => OutcomeKind::RateLimited,
            Self::EmptyResponse => OutcomeKind::EmptyResponse,
            Self::SafetyBlocked { .. } => OutcomeKind::SafetyBlocked,
            Self::Failure(_) => OutcomeKind::Failure,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Success(text) => Some(text),
            _ => None,
        }
    }

    /// Collapse into a `Result`, turning every non-success into an error
    pub fn into_result(self) -> Result<String> {
        match self {
            Self::Success(text) => Ok(text),
            Self::Failure(err) => Err(FinError::Llm(err)),
            Self::RateLimited { after_attempts } => Err(FinError::llm_with_category(
                ErrorCategory::RateLimit,
                format!("still rate limited after {} attempts", after_attempts),
            )),
            Self::EmptyResponse => Err(FinError::llm_with_category(
                ErrorCategory::ParseError,
                "backend returned no content",
            )),
            Self::SafetyBlocked { reason } => Err(FinError::llm_with_category(
                ErrorCategory::BadRequest,
                format!("blocked by safety filter: {}", reason),
            )),
        }
    }
}

/// Classify a reply that arrived without a transport or API error
pub fn classify_reply(reply: BackendReply) -> GenerationOutcome {
    if let Some(text) = reply.text.as_deref().map(str::trim)
        && !text.is_empty()
    {
        return GenerationOutcome::Success(text.to_string());
    }

    match reply.block_reason {
        Some(reason) => GenerationOutcome::SafetyBlocked { reason },
        None => GenerationOutcome::EmptyResponse,
    }
}

// =============================================================================
// Attempt Bookkeeping
// =============================================================================

/// One pass through the retry loop
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationAttempt {
    /// 0-based attempt index
    pub index: u32,
    /// Total backoff slept before this attempt started
    pub elapsed_delay: Duration,
    /// How this attempt ended
    pub outcome: OutcomeKind,
    /// Backoff slept after this attempt, if a retry followed
    pub backoff: Option<Duration>,
}

/// Outcome plus the trace of attempts that produced it
#[derive(Debug, Clone)]
pub struct InvocationReport {
    pub outcome: GenerationOutcome,
    pub attempts: Vec<GenerationAttempt>,
    pub total_delay: Duration,
}

// =============================================================================
// Invoker
// =============================================================================

/// Bounded-retry wrapper around a [`GenerationBackend`](super::GenerationBackend)
#[derive(Clone)]
pub struct ModelInvoker {
    backend: SharedBackend,
    policy: BackoffPolicy,
}

impl ModelInvoker {
    pub fn new(backend: SharedBackend) -> Self {
        Self {
            backend,
            policy: BackoffPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: BackoffPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> BackoffPolicy {
        self.policy
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Invoke with the configured policy
    pub async fn invoke(&self, prompt: &str) -> GenerationOutcome {
        self.invoke_with_report(prompt, self.policy).await.outcome
    }

    /// Invoke with an explicit attempt budget and base delay
    pub async fn invoke_with(
        &self,
        prompt: &str,
        max_attempts: u32,
        base_delay: Duration,
    ) -> GenerationOutcome {
        let policy = BackoffPolicy {
            max_attempts,
            base_delay,
            ..self.policy
        };
        self.invoke_with_report(prompt, policy).await.outcome
    }

    /// Run the retry loop and return the full attempt trace
    #[instrument(
        skip(self, prompt, policy),
        fields(
            backend = %self.backend.name(),
            model = %self.backend.model(),
            prompt_len = prompt.len(),
            max_attempts = policy.max_attempts
        )
    )]
    pub async fn invoke_with_report(&self, prompt: &str, policy: BackoffPolicy) -> InvocationReport {
        let mut attempts: Vec<GenerationAttempt> = Vec::new();
        let mut total_delay = Duration::ZERO;

        for attempt in 0..policy.max_attempts {
            debug!(attempt, "Generation attempt");

            match self.backend.generate(prompt).await {
                Ok(reply) => {
                    let outcome = classify_reply(reply);
                    attempts.push(GenerationAttempt {
                        index: attempt,
                        elapsed_delay: total_delay,
                        outcome: outcome.kind(),
                        backoff: None,
                    });
                    match &outcome {
                        GenerationOutcome::Success(text) => {
                            info!(attempts = attempt + 1, response_len = text.len(), "Generation succeeded")
                        }
                        GenerationOutcome::SafetyBlocked { reason } => {
                            warn!(attempt, reason = %reason, "Generation blocked by safety filter")
                        }
                        _ => warn!(attempt, "Generation returned no content"),
                    }
                    return InvocationReport {
                        outcome,
                        attempts,
                        total_delay,
                    };
                }
                Err(err) if err.is_rate_limit() => {
                    if policy.should_retry(attempt, err.category) {
                        let delay = policy.next_delay(attempt);
                        attempts.push(GenerationAttempt {
                            index: attempt,
                            elapsed_delay: total_delay,
                            outcome: OutcomeKind::RateLimited,
                            backoff: Some(delay),
                        });
                        warn!(
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "Rate limited, backing off before retry"
                        );
                        sleep(delay).await;
                        total_delay = total_delay.saturating_add(delay);
                        continue;
                    }

                    attempts.push(GenerationAttempt {
                        index: attempt,
                        elapsed_delay: total_delay,
                        outcome: OutcomeKind::RateLimited,
                        backoff: None,
                    });
                    warn!(attempts = attempt + 1, error = %err, "Rate limit persisted, giving up");
                    return InvocationReport {
                        outcome: GenerationOutcome::RateLimited {
                            after_attempts: attempt + 1,
                        },
                        attempts,
                        total_delay,
                    };
                }
                Err(err) => {
                    attempts.push(GenerationAttempt {
                        index: attempt,
                        elapsed_delay: total_delay,
                        outcome: OutcomeKind::Failure,
                        backoff: None,
                    });
                    error!(attempt, category = %err.category, error = %err, "Generation failed");
                    return InvocationReport {
                        outcome: GenerationOutcome::Failure(err),
                        attempts,
                        total_delay,
                    };
                }
            }
        }

        InvocationReport {
            outcome: GenerationOutcome::RateLimited {
                after_attempts: policy.max_attempts,
            },
            attempts,
            total_delay,
        }
    }
}
