//! Persisted finance records and their request payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: String,
    pub amount: f64,
    pub category: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
}

/// Payload for creating or replacing a transaction
///
/// A missing or blank `category` asks the server to categorize the
/// description. A missing `date` means "now".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTransaction {
    pub amount: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl NewTransaction {
    /// Category supplied by the caller, if non-blank
    pub fn explicit_category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// Fully resolved transaction fields, ready to store
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    pub amount: f64,
    pub category: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
}

/// Per-user account profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub user_id: String,
    pub initial_balance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub initial_balance: f64,
}

/// Prompt-ready projection of a transaction
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionSummaryLine {
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    pub category: String,
    pub amount: f64,
}

impl From<&Transaction> for TransactionSummaryLine {
    fn from(tx: &Transaction) -> Self {
        Self {
            date: tx.date,
            description: tx.description.clone(),
            category: tx.category.clone(),
            amount: tx.amount,
        }
    }
}
