//! Caller-Level Deadlines
//!
//! The invoker itself never gives up early; callers that need a hard ceiling
//! on a whole retry loop wrap it here.

use std::future::Future;
use std::time::Duration;

use crate::constants::network as net_constants;
use crate::types::{FinError, Result};

/// Deadlines for the assistant's model-backed operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Ceiling for a chat answer, backoff sleeps included
    pub chat: Duration,
    /// Ceiling for a single categorization
    pub categorize: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            chat: Duration::from_secs(net_constants::ASSISTANT_TIMEOUT_SECS),
            categorize: Duration::from_secs(net_constants::ASSISTANT_TIMEOUT_SECS),
        }
    }
}

impl TimeoutConfig {
    /// Same ceiling for every operation
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            chat: timeout,
            categorize: timeout,
        }
    }
}

/// Run a future under a deadline; expiry becomes `FinError::Timeout`
pub async fn with_timeout_map<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(timeout, future)
        .await
        .map_err(|_| FinError::timeout(operation_name, timeout))
}
