//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Model call retry constants
pub mod retry {
    /// Total attempts per invocation (first call included)
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 2_000;

    /// Upper bound (exclusive) of the random jitter added to each delay (milliseconds)
    pub const MAX_JITTER_MS: u64 = 1_000;
}

/// Chat context assembly constants
pub mod context {
    /// Most recent transactions included in a chat prompt
    pub const MAX_RECENT_TRANSACTIONS: usize = 20;

    /// Line emitted when a user has no transactions yet
    pub const NO_TRANSACTIONS_LINE: &str = "No recent transactions found.";

    /// Placeholder for transactions stored without a description
    pub const MISSING_DESCRIPTION: &str = "No description";
}

/// User profile constants
pub mod profile {
    /// Balance assigned to a profile created on first access
    pub const DEFAULT_INITIAL_BALANCE: f64 = 5000.0;
}

/// Transaction listing constants
pub mod listing {
    /// Default page size for `GET /transactions/`
    pub const DEFAULT_LIMIT: u32 = 100;

    /// Hard cap on page size
    pub const MAX_LIMIT: u32 = 1_000;
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout for backend HTTP calls (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

    /// Default caller-level deadline for a whole assistant call (seconds)
    pub const ASSISTANT_TIMEOUT_SECS: u64 = 90;
}

/// Server constants
pub mod server {
    pub const DEFAULT_HOST: &str = "127.0.0.1";

    pub const DEFAULT_PORT: u16 = 8000;

    /// Request body size limit (bytes)
    pub const BODY_LIMIT_BYTES: usize = 64 * 1024;
}
