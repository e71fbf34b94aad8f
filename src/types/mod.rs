pub mod category;
pub mod error;
pub mod finance;

pub use category::CategoryLabel;
pub use error::{ErrorCategory, ErrorClassifier, FinError, LlmError, Result, ResultExt};
pub use finance::{
    NewTransaction, ProfileUpdate, Transaction, TransactionDraft, TransactionSummaryLine,
    UserProfile,
};

// =============================================================================
// Domain Newtypes
// =============================================================================

use std::fmt;

/// Opaque partition key produced by identity verification
///
/// Prevents accidental mixing of user IDs with other string types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
