//! Finance Assistant
//!
//! Sits between the transport layers (HTTP, CLI) and the model core:
//! - Categorization never fails; anything but a clean label is `Miscellaneous`
//! - Chat never fails; every non-success outcome becomes a readable message
//! - CRUD goes straight to the stores, with categorization filled in on write

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use crate::ai::{
    GenerationOutcome, ModelInvoker, TimeoutConfig, build_categorization_prompt,
    build_chat_prompt, create_backend, normalize_outcome, with_timeout_map,
};
use crate::config::Config;
use crate::constants::{context, listing, profile};
use crate::storage::{Database, PoolConfig, ProfileStore, TransactionStore};
use crate::types::{
    CategoryLabel, FinError, NewTransaction, ProfileUpdate, Result, Transaction,
    TransactionDraft, TransactionSummaryLine, UserId, UserProfile,
};

/// User-facing chat replies for non-success outcomes
pub mod messages {
    pub const RATE_LIMITED: &str =
        "I'm currently receiving too many requests. Please try again in a minute.";
    pub const SAFETY_BLOCKED: &str =
        "I'm sorry, but I can't help with that request. Please ask something else about your finances.";
    pub const EMPTY_RESPONSE: &str =
        "I couldn't generate a response right now. Please try rephrasing your question.";
    pub const FAILURE: &str =
        "Sorry, something went wrong while generating a response. Please try again later.";
    pub const TIMEOUT: &str = "Sorry, that took too long to answer. Please try again later.";
}

/// Tunables for the assistant
#[derive(Debug, Clone)]
pub struct AssistantSettings {
    pub timeouts: TimeoutConfig,
    /// Transactions included as chat context
    pub history_limit: usize,
    /// Extra instructions for chat prompts
    pub guidance: String,
    /// Balance for profiles created on first access
    pub default_initial_balance: f64,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            timeouts: TimeoutConfig::default(),
            history_limit: context::MAX_RECENT_TRANSACTIONS,
            guidance: String::new(),
            default_initial_balance: profile::DEFAULT_INITIAL_BALANCE,
        }
    }
}

impl From<&Config> for AssistantSettings {
    fn from(config: &Config) -> Self {
        Self {
            timeouts: TimeoutConfig::uniform(config.chat.request_timeout()),
            history_limit: config.chat.history_limit,
            guidance: config.chat.guidance.clone(),
            default_initial_balance: config.profile.default_initial_balance,
        }
    }
}

/// Shared assistant handle
pub type SharedAssistant = Arc<FinanceAssistant>;

pub struct FinanceAssistant {
    invoker: ModelInvoker,
    transactions: Arc<dyn TransactionStore>,
    profiles: Arc<dyn ProfileStore>,
    settings: AssistantSettings,
}

impl FinanceAssistant {
    pub fn new(
        invoker: ModelInvoker,
        transactions: Arc<dyn TransactionStore>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        Self {
            invoker,
            transactions,
            profiles,
            settings: AssistantSettings::default(),
        }
    }

    /// Wire the configured backend, retry policy and SQLite stores
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend = create_backend(&config.llm.provider_config())?;
        let invoker = ModelInvoker::new(backend).with_policy(config.retry.policy());

        let db = Database::open_with_config(
            &config.database.path,
            PoolConfig::with_max_size(config.database.pool_size),
        )?;
        db.initialize()?;
        info!(
            path = %config.database.path.display(),
            backend = invoker.backend_name(),
            "Assistant ready"
        );

        let store = Arc::new(db);
        Ok(Self::new(invoker, store.clone(), store).with_settings(AssistantSettings::from(config)))
    }

    pub fn with_settings(mut self, settings: AssistantSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn backend_name(&self) -> &str {
        self.invoker.backend_name()
    }

    // =========================================================================
    // Model-backed operations
    // =========================================================================

    /// Categorize a transaction description; never fails
    #[instrument(skip(self, description), fields(description_len = description.len()))]
    pub async fn categorize(&self, description: &str) -> CategoryLabel {
        if description.trim().is_empty() {
            debug!("Blank description, skipping model call");
            return CategoryLabel::Miscellaneous;
        }

        let prompt = build_categorization_prompt(description);
        let outcome = self
            .run_with_deadline(&prompt, self.settings.timeouts.categorize, "categorization")
            .await;

        let label = match &outcome {
            Some(outcome) => normalize_outcome(outcome),
            None => CategoryLabel::Miscellaneous,
        };
        debug!(label = %label, "Categorized transaction");
        label
    }

    /// Answer a free-text question grounded in the user's recent transactions;
    /// never fails
    #[instrument(skip(self, question), fields(user = %user, question_len = question.len()))]
    pub async fn answer(&self, user: &UserId, question: &str) -> String {
        let recent = match self
            .transactions
            .list_recent(user, self.settings.history_limit)
            .await
        {
            Ok(transactions) => transactions,
            Err(e) => {
                warn!(error = %e, "Failed to load chat context, answering without history");
                Vec::new()
            }
        };

        let lines: Vec<TransactionSummaryLine> = recent.iter().map(Into::into).collect();
        let prompt = build_chat_prompt(question, &lines, &self.settings.guidance);

        match self
            .run_with_deadline(&prompt, self.settings.timeouts.chat, "chat answer")
            .await
        {
            Some(outcome) => chat_reply(outcome),
            None => messages::TIMEOUT.to_string(),
        }
    }

    /// Invoke under a caller-level deadline; `None` when it expires
    async fn run_with_deadline(
        &self,
        prompt: &str,
        deadline: Duration,
        operation: &str,
    ) -> Option<GenerationOutcome> {
        match with_timeout_map(deadline, self.invoker.invoke(prompt), operation).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(error = %e, "Model call abandoned");
                None
            }
        }
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Store a transaction, categorizing it when no category was given
    pub async fn create_transaction(&self, user: &UserId, input: NewTransaction) -> Result<Transaction> {
        validate_amount(input.amount)?;

        let category = match input.explicit_category() {
            Some(category) => category.to_string(),
            None => self.categorize(input.description_or_empty()).await.to_string(),
        };

        let draft = TransactionDraft {
            amount: input.amount,
            category,
            description: input.description,
            date: input.date.unwrap_or_else(Utc::now),
        };

        let created = self.transactions.create(user, draft).await?;
        info!(user = %user, id = created.id, category = %created.category, "Transaction created");
        Ok(created)
    }

    /// Replace a transaction; a missing category or date keeps the stored one
    pub async fn update_transaction(
        &self,
        user: &UserId,
        id: i64,
        input: NewTransaction,
    ) -> Result<Transaction> {
        validate_amount(input.amount)?;
        let existing = self.transactions.get(user, id).await?;

        let draft = TransactionDraft {
            amount: input.amount,
            category: input
                .explicit_category()
                .map(str::to_string)
                .unwrap_or(existing.category),
            description: input.description,
            date: input.date.unwrap_or(existing.date),
        };

        self.transactions.update(user, id, draft).await
    }

    pub async fn delete_transaction(&self, user: &UserId, id: i64) -> Result<()> {
        self.transactions.delete(user, id).await?;
        info!(user = %user, id, "Transaction deleted");
        Ok(())
    }

    pub async fn list_transactions(&self, user: &UserId, skip: u32, limit: u32) -> Result<Vec<Transaction>> {
        self.transactions
            .list(user, skip, limit.min(listing::MAX_LIMIT))
            .await
    }

    // =========================================================================
    // Profile
    // =========================================================================

    pub async fn profile(&self, user: &UserId) -> Result<UserProfile> {
        self.profiles
            .get_or_create(user, self.settings.default_initial_balance)
            .await
    }

    pub async fn update_profile(&self, user: &UserId, update: ProfileUpdate) -> Result<UserProfile> {
        validate_amount(update.initial_balance)?;
        self.profiles.upsert(user, update.initial_balance).await
    }
}

/// Text shown to the user for a chat outcome
pub fn chat_reply(outcome: GenerationOutcome) -> String {
    match outcome {
        GenerationOutcome::Success(text) => text,
        GenerationOutcome::RateLimited { after_attempts } => {
            warn!(after_attempts, "Chat gave up on rate limit");
            messages::RATE_LIMITED.to_string()
        }
        GenerationOutcome::SafetyBlocked { reason } => {
            info!(reason = %reason, "Chat answer blocked");
            messages::SAFETY_BLOCKED.to_string()
        }
        GenerationOutcome::EmptyResponse => messages::EMPTY_RESPONSE.to_string(),
        GenerationOutcome::Failure(err) => {
            error!(error = %err, "Chat generation failed");
            messages::FAILURE.to_string()
        }
    }
}

fn validate_amount(amount: f64) -> Result<()> {
    if amount.is_finite() {
        Ok(())
    } else {
        Err(FinError::Validation("amount must be a finite number".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::BackoffPolicy;
    use crate::ai::provider::BackendReply;
    use crate::ai::provider::testing::{ScriptedBackend, failure, rate_limited, text};
    use crate::storage::Database;
    use crate::types::ErrorCategory;
    use chrono::TimeZone;

    fn assistant_with_policy(
        backend: Arc<ScriptedBackend>,
        policy: BackoffPolicy,
    ) -> (FinanceAssistant, Database) {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        let store = Arc::new(db.clone());
        let invoker = ModelInvoker::new(backend).with_policy(policy);
        (FinanceAssistant::new(invoker, store.clone(), store), db)
    }

    fn assistant(backend: Arc<ScriptedBackend>) -> (FinanceAssistant, Database) {
        let fast = BackoffPolicy::new(3, Duration::from_millis(5)).with_max_jitter(Duration::ZERO);
        assistant_with_policy(backend, fast)
    }

    fn purchase(description: &str) -> NewTransaction {
        NewTransaction {
            amount: 23.4,
            category: None,
            description: Some(description.to_string()),
            date: None,
        }
    }

    #[tokio::test]
    async fn test_categorize_uses_model_label() {
        let backend = Arc::new(ScriptedBackend::always(text(" Transport ")));
        let (assistant, _) = assistant(backend.clone());

        assert_eq!(assistant.categorize("Uber ride").await, CategoryLabel::Transport);
        assert!(backend.prompts()[0].contains("\"Uber ride\""));
    }

    #[tokio::test]
    async fn test_categorize_falls_back_on_failure() {
        for step in [
            failure(ErrorCategory::Auth),
            Ok(BackendReply::empty()),
            Ok(BackendReply::blocked("SAFETY")),
            text("Pets"),
        ] {
            let (assistant, _) = assistant(Arc::new(ScriptedBackend::always(step)));
            assert_eq!(assistant.categorize("Dog food").await, CategoryLabel::Miscellaneous);
        }
    }

    #[tokio::test]
    async fn test_blank_description_skips_model() {
        let backend = Arc::new(ScriptedBackend::always(text("Food")));
        let (assistant, _) = assistant(backend.clone());

        assert_eq!(assistant.categorize("  ").await, CategoryLabel::Miscellaneous);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_categorize_times_out_to_miscellaneous() {
        let backend = Arc::new(ScriptedBackend::always(rate_limited()));
        let (assistant, _) =
            assistant_with_policy(backend.clone(), BackoffPolicy::new(3, Duration::from_secs(30)));
        let assistant = assistant.with_settings(AssistantSettings {
            timeouts: TimeoutConfig::uniform(Duration::from_secs(5)),
            ..Default::default()
        });

        assert_eq!(assistant.categorize("Taxi").await, CategoryLabel::Miscellaneous);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_create_without_category_is_categorized() {
        let (assistant, _) = assistant(Arc::new(ScriptedBackend::always(text("Food"))));
        let user = UserId::from("alice");

        let tx = assistant
            .create_transaction(&user, purchase("Groceries"))
            .await
            .unwrap();
        assert_eq!(tx.category, "Food");
        assert_eq!(tx.user_id, "alice");
    }

    #[tokio::test]
    async fn test_create_survives_backend_failure() {
        let (assistant, _) = assistant(Arc::new(ScriptedBackend::always(failure(
            ErrorCategory::Network,
        ))));

        let tx = assistant
            .create_transaction(&UserId::from("alice"), purchase("Mystery"))
            .await
            .unwrap();
        assert_eq!(tx.category, "Miscellaneous");
    }

    #[tokio::test]
    async fn test_create_keeps_explicit_category() {
        let backend = Arc::new(ScriptedBackend::always(text("Food")));
        let (assistant, _) = assistant(backend.clone());

        let tx = assistant
            .create_transaction(
                &UserId::from("alice"),
                NewTransaction {
                    category: Some("Housing".to_string()),
                    ..purchase("Rent")
                },
            )
            .await
            .unwrap();
        assert_eq!(tx.category, "Housing");
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_non_finite_amount() {
        let (assistant, _) = assistant(Arc::new(ScriptedBackend::always(text("Food"))));
        let err = assistant
            .create_transaction(
                &UserId::from("alice"),
                NewTransaction {
                    amount: f64::INFINITY,
                    ..purchase("x")
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FinError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_keeps_category_and_date_when_missing() {
        let (assistant, _) = assistant(Arc::new(ScriptedBackend::always(text("Food"))));
        let user = UserId::from("alice");
        let date = Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap();

        let tx = assistant
            .create_transaction(
                &user,
                NewTransaction {
                    date: Some(date),
                    ..purchase("Lunch")
                },
            )
            .await
            .unwrap();

        let updated = assistant
            .update_transaction(
                &user,
                tx.id,
                NewTransaction {
                    amount: 30.0,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.category, "Food");
        assert_eq!(updated.date, date);
        assert_eq!(updated.amount, 30.0);
        assert_eq!(updated.description, None);
    }

    #[tokio::test]
    async fn test_answer_includes_recent_history() {
        let backend = Arc::new(ScriptedBackend::always(text("- You spend a lot on coffee.")));
        let (assistant, _) = assistant(backend.clone());
        let user = UserId::from("alice");

        assistant
            .create_transaction(
                &user,
                NewTransaction {
                    category: Some("Food".to_string()),
                    ..purchase("Coffee")
                },
            )
            .await
            .unwrap();

        let reply = assistant.answer(&user, "Where does my money go?").await;
        assert_eq!(reply, "- You spend a lot on coffee.");

        let prompt = backend.prompts().pop().unwrap();
        assert!(prompt.contains(": Coffee (Food) - $23.40"));
        assert!(prompt.contains("Where does my money go?"));
    }

    #[tokio::test]
    async fn test_answer_without_history() {
        let backend = Arc::new(ScriptedBackend::always(text("Start tracking!")));
        let (assistant, _) = assistant(backend.clone());

        assistant.answer(&UserId::from("nobody"), "Hi").await;
        assert!(backend.prompts()[0].contains("No recent transactions found."));
    }

    #[tokio::test]
    async fn test_answer_soft_messages() {
        let cases = [
            (rate_limited(), messages::RATE_LIMITED),
            (Ok(BackendReply::blocked("SAFETY")), messages::SAFETY_BLOCKED),
            (Ok(BackendReply::empty()), messages::EMPTY_RESPONSE),
            (failure(ErrorCategory::Auth), messages::FAILURE),
        ];
        for (step, expected) in cases {
            let (assistant, _) = assistant(Arc::new(ScriptedBackend::always(step)));
            assert_eq!(assistant.answer(&UserId::from("alice"), "Budget?").await, expected);
        }
    }

    #[tokio::test]
    async fn test_profile_defaults_and_updates() {
        let (assistant, _) = assistant(Arc::new(ScriptedBackend::always(text("Food"))));
        let user = UserId::from("alice");

        assert_eq!(assistant.profile(&user).await.unwrap().initial_balance, 5000.0);
        let updated = assistant
            .update_profile(&user, ProfileUpdate { initial_balance: 1234.5 })
            .await
            .unwrap();
        assert_eq!(updated.initial_balance, 1234.5);
        assert_eq!(assistant.profile(&user).await.unwrap().initial_balance, 1234.5);
    }

    #[tokio::test]
    async fn test_list_is_capped() {
        let (assistant, db) = assistant(Arc::new(ScriptedBackend::always(text("Food"))));
        let user = UserId::from("alice");
        for i in 0..3 {
            assistant
                .create_transaction(&user, purchase(&format!("Item {i}")))
                .await
                .unwrap();
        }
        assert_eq!(assistant.list_transactions(&user, 0, u32::MAX).await.unwrap().len(), 3);
        assert_eq!(db.list_transactions(&user, 0, 2).unwrap().len(), 2);
    }
}
