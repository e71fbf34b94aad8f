//! fintrack - Personal Finance Tracker Backend
//!
//! Stores per-user transactions and profiles behind a bearer-token HTTP API,
//! and uses a generation backend to categorize transactions and answer
//! questions about a user's spending.
//!
//! ## Core Features
//!
//! - **Categorization**: free-text descriptions mapped onto a fixed label set
//! - **Chat**: answers grounded in the user's most recent transactions
//! - **Rate-limit resilience**: exponential backoff with jitter and a bounded
//!   attempt budget; chat degrades to friendly text instead of erroring
//! - **Storage**: SQLite with connection pooling, every query user-scoped
//!
//! ## Quick Start
//!
//! ```ignore
//! use fintrack::{Config, FinanceAssistant};
//!
//! let config = Config::default();
//! let assistant = FinanceAssistant::from_config(&config)?;
//! let label = assistant.categorize("Uber ride to airport").await;
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: generation backends, retry invoker, prompts
//! - [`auth`]: JWT bearer-token verification
//! - [`server`]: axum HTTP API
//! - [`service`]: the finance assistant tying stores and model together
//! - [`storage`]: SQLite persistence with connection pooling
//! - [`config`]: layered configuration

pub mod ai;
pub mod auth;
pub mod cli;
pub mod config;
pub mod constants;
pub mod server;
pub mod service;
pub mod storage;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use config::{Config, ConfigLoader};

pub use types::{CategoryLabel, ErrorCategory, FinError, Result, ResultExt, UserId};

pub use storage::{Database, PoolConfig, SharedDatabase};

pub use service::{FinanceAssistant, SharedAssistant};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    BackoffPolicy, GenerationBackend, GenerationOutcome, ModelInvoker, SharedBackend,
    TimeoutConfig, create_backend, with_timeout_map,
};
