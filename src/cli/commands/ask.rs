//! Ask Command
//!
//! Put a question to the assistant using a user's stored transactions.

use crate::cli::CommandContext;
use crate::types::{FinError, Result, UserId};

pub async fn run(ctx: &CommandContext, user: &str, question: &str) -> Result<()> {
    if question.trim().is_empty() {
        return Err(FinError::Validation("question must not be empty".to_string()));
    }

    let assistant = ctx.assistant()?;
    let answer = assistant.answer(&UserId::from(user), question).await;
    ctx.output.result(&answer);
    Ok(())
}
