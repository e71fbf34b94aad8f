//! Scripted backends for tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use super::{BackendReply, GenerationBackend};
use crate::types::{ErrorCategory, LlmError};

pub(crate) type Step = std::result::Result<BackendReply, LlmError>;

/// Replays a fixed script of replies; the last step repeats forever
pub(crate) struct ScriptedBackend {
    steps: Mutex<VecDeque<Step>>,
    last: Mutex<Option<Step>>,
    calls: AtomicU32,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            last: Mutex::new(None),
            calls: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn always(step: Step) -> Self {
        Self::new(vec![step])
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

pub(crate) fn rate_limited() -> Step {
    Err(LlmError::with_provider(
        ErrorCategory::RateLimit,
        "Resource has been exhausted",
        "scripted",
    ))
}

pub(crate) fn failure(category: ErrorCategory) -> Step {
    Err(LlmError::with_provider(category, "scripted failure", "scripted"))
}

pub(crate) fn text(text: &str) -> Step {
    Ok(BackendReply::text(text))
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn generate(&self, prompt: &str) -> std::result::Result<BackendReply, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        let next = self.steps.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(step) => {
                *last = Some(step.clone());
                step
            }
            None => last.clone().unwrap_or_else(|| Ok(BackendReply::empty())),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}

/// Replies with the prompt it was given, after an optional delay
pub(crate) struct EchoBackend {
    pub(crate) delay: std::time::Duration,
}

#[async_trait]
impl GenerationBackend for EchoBackend {
    async fn generate(&self, prompt: &str) -> std::result::Result<BackendReply, LlmError> {
        tokio::time::sleep(self.delay).await;
        Ok(BackendReply::text(prompt))
    }

    fn name(&self) -> &str {
        "echo"
    }

    fn model(&self) -> &str {
        "echo-model"
    }
}
