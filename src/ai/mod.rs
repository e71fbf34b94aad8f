//! Model Integration Layer
//!
//! Resilient access to an external generation backend plus the prompts the
//! finance assistant sends it.

pub mod backoff;
pub mod invoker;
pub mod prompt;
pub mod provider;
pub mod timeout;

pub use backoff::{BackoffPolicy, next_delay, should_retry};
pub use invoker::{
    GenerationAttempt, GenerationOutcome, InvocationReport, ModelInvoker, OutcomeKind,
    classify_reply,
};
pub use prompt::{
    PromptBuilder, build_categorization_prompt, build_chat_prompt, normalize_category,
    normalize_outcome,
};
pub use provider::{
    BackendReply, GeminiBackend, GenerationBackend, OpenAiBackend, ProviderConfig, SharedBackend,
    TokenUsage, create_backend,
};
pub use timeout::{TimeoutConfig, with_timeout_map};
