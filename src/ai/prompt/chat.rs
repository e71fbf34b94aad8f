//! Chat context assembly.
//!
//! Renders recent transactions into a grounding block and wraps it with the
//! advisor preamble and the user's question.

use super::PromptBuilder;
use crate::constants::context::{MAX_RECENT_TRANSACTIONS, MISSING_DESCRIPTION, NO_TRANSACTIONS_LINE};
use crate::types::TransactionSummaryLine;

const PERSONA: &str = "a helpful personal financial advisor";

const ANSWER_RULES: [&str; 3] = [
    "Answer as a short bulleted list.",
    "Keep the whole answer brief: a few bullets, one sentence each.",
    "Base any numbers on the transactions below; say so if they are not enough to answer.",
];

/// `"<YYYY-MM-DD>: <description> (<category>) - $<amount>"`
///
/// Always a single line: whitespace runs in the description collapse to one space.
pub fn render_transaction_line(line: &TransactionSummaryLine) -> String {
    let description = line
        .description
        .as_deref()
        .map(|d| d.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| MISSING_DESCRIPTION.to_string());

    format!(
        "{}: {} ({}) - ${:.2}",
        line.date.format("%Y-%m-%d"),
        description,
        line.category,
        line.amount
    )
}

/// One line per transaction in the given order, capped at the context limit
pub fn render_transaction_block(recent: &[TransactionSummaryLine]) -> String {
    if recent.is_empty() {
        return NO_TRANSACTIONS_LINE.to_string();
    }

    recent
        .iter()
        .take(MAX_RECENT_TRANSACTIONS)
        .map(render_transaction_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the full chat prompt
///
/// `recent` must already be ordered most-recent-first. Blank `guidance` is
/// omitted.
pub fn build_chat_prompt(question: &str, recent: &[TransactionSummaryLine], guidance: &str) -> String {
    PromptBuilder::new()
        .role(PERSONA)
        .rules(ANSWER_RULES)
        .optional_section("Additional guidance", Some(guidance))
        .section("Recent transactions", &render_transaction_block(recent))
        .section("Question", question)
        .build()
}
