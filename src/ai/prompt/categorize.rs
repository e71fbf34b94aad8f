//! Transaction categorization prompt and label normalization.
//!
//! Model output is only ever accepted as a member of [`CategoryLabel`]; every
//! other answer, and every failed call, lands on `Miscellaneous`.

use tracing::debug;

use super::PromptBuilder;
use crate::ai::invoker::GenerationOutcome;
use crate::types::CategoryLabel;

/// Build the single-label categorization prompt
pub fn build_categorization_prompt(description: &str) -> String {
    PromptBuilder::new()
        .text(&format!(
            "Categorize the following transaction description into one of these categories: {}.",
            CategoryLabel::enumeration()
        ))
        .section("Description", &format!("\"{}\"", description.trim()))
        .text("Return ONLY the category name, with no punctuation or explanation.")
        .build()
}

/// Normalize raw model text into a label
///
/// Trims whitespace, then tolerates one layer of surrounding quotes or
/// backticks and a trailing period before a case-insensitive match.
pub fn normalize_category(raw: Option<&str>) -> CategoryLabel {
    let Some(raw) = raw else {
        return CategoryLabel::Miscellaneous;
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CategoryLabel::Miscellaneous;
    }

    let cleaned = trimmed
        .trim_end_matches('.')
        .trim_matches(|c| matches!(c, '"' | '\'' | '`'))
        .trim_end_matches('.')
        .trim();

    match cleaned.parse::<CategoryLabel>() {
        Ok(label) => label,
        Err(_) => {
            debug!(raw = %trimmed, "Model label outside taxonomy, using Miscellaneous");
            CategoryLabel::Miscellaneous
        }
    }
}

/// Label for any invocation outcome; non-success always yields `Miscellaneous`
pub fn normalize_outcome(outcome: &GenerationOutcome) -> CategoryLabel {
    normalize_category(outcome.text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ErrorCategory, LlmError};

    #[test]
    fn test_prompt_lists_every_label() {
        let prompt = build_categorization_prompt("Uber to airport");
        for label in CategoryLabel::ALL {
            assert!(prompt.contains(label.as_str()), "missing {label}");
        }
        assert!(prompt.contains("\"Uber to airport\""));
        assert!(prompt.contains("Return ONLY the category name"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(
            build_categorization_prompt("Groceries at Aldi"),
            build_categorization_prompt("Groceries at Aldi")
        );
    }

    #[test]
    fn test_trimmed_label_passes() {
        assert_eq!(normalize_category(Some(" Food ")), CategoryLabel::Food);
        assert_eq!(normalize_category(Some("Transport\n")), CategoryLabel::Transport);
    }

    #[test]
    fn test_tolerated_decorations() {
        assert_eq!(normalize_category(Some("\"Housing\"")), CategoryLabel::Housing);
        assert_eq!(normalize_category(Some("health.")), CategoryLabel::Health);
        assert_eq!(normalize_category(Some("`Income`")), CategoryLabel::Income);
        assert_eq!(normalize_category(Some("'Shopping.'")), CategoryLabel::Shopping);
    }

    #[test]
    fn test_empty_and_missing_fall_back() {
        assert_eq!(normalize_category(None), CategoryLabel::Miscellaneous);
        assert_eq!(normalize_category(Some("")), CategoryLabel::Miscellaneous);
        assert_eq!(normalize_category(Some("   \n")), CategoryLabel::Miscellaneous);
    }

    #[test]
    fn test_out_of_taxonomy_falls_back() {
        assert_eq!(normalize_category(Some("Groceries")), CategoryLabel::Miscellaneous);
        assert_eq!(
            normalize_category(Some("The category is Food")),
            CategoryLabel::Miscellaneous
        );
    }

    #[test]
    fn test_non_success_outcomes_fall_back() {
        let outcomes = [
            GenerationOutcome::EmptyResponse,
            GenerationOutcome::RateLimited { after_attempts: 3 },
            GenerationOutcome::SafetyBlocked {
                reason: "SAFETY".to_string(),
            },
            GenerationOutcome::Failure(LlmError::new(ErrorCategory::Network, "down")),
        ];
        for outcome in &outcomes {
            assert_eq!(normalize_outcome(outcome), CategoryLabel::Miscellaneous);
        }
        assert_eq!(
            normalize_outcome(&GenerationOutcome::Success("Utilities".to_string())),
            CategoryLabel::Utilities
        );
    }
}
