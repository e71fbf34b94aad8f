//! Categorize Command
//!
//! One-off categorization of a description, for checking backend setup.

use crate::cli::CommandContext;
use crate::types::{FinError, Result};

pub async fn run(ctx: &CommandContext, description: &str) -> Result<()> {
    if description.trim().is_empty() {
        return Err(FinError::Validation("description must not be empty".to_string()));
    }

    let assistant = ctx.assistant()?;
    let label = assistant.categorize(description).await;
    ctx.output.result(label.as_str());
    Ok(())
}
