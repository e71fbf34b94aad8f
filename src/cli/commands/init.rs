//! Init Command
//!
//! Set up fintrack in the current directory: project config plus database.

use crate::cli::CommandContext;
use crate::config::ConfigLoader;
use crate::storage::{Database, PoolConfig};
use crate::types::{FinError, Result};

pub fn run(ctx: &CommandContext, force: bool) -> Result<()> {
    let root = crate::cli::project_root()?;
    let config_path = root.join(ConfigLoader::project_config_path());

    if config_path.exists() && !force {
        return Err(FinError::Config(
            "Already initialized. Use --force to overwrite.".to_string(),
        ));
    }

    ConfigLoader::init_project(&root, force)?;

    // Global config is optional; never overwrite it here
    if let Err(e) = ConfigLoader::init_global(false) {
        tracing::debug!("Global config init skipped: {}", e);
    }

    let db_path = root.join(&ctx.config.database.path);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = Database::open_with_config(
        &db_path,
        PoolConfig::with_max_size(ctx.config.database.pool_size),
    )?;
    db.initialize()?;

    let out = &ctx.output;
    out.success("Initialized fintrack");
    out.detail("Config", &config_path.display().to_string());
    out.detail("Database", &db_path.display().to_string());
    out.section("Next steps");
    out.info("Set GEMINI_API_KEY (or switch llm.provider to openai)");
    out.info("Set SUPABASE_JWT_SECRET for token verification");
    out.info("Run 'fintrack serve'");
    Ok(())
}
