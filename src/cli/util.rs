//! CLI Common Utilities
//!
//! Shared initialization for command handlers.

use std::path::{Path, PathBuf};

use crate::config::{Config, ConfigLoader};
use crate::service::FinanceAssistant;
use crate::types::{FinError, Result};

use super::ui::Output;

/// Command execution context
///
/// Created once in `main` and handed to every command.
pub struct CommandContext {
    /// Effective configuration
    pub config: Config,
    /// File passed with `--config`, if any
    pub config_path: Option<PathBuf>,
    pub output: Output,
}

impl CommandContext {
    /// Resolve configuration; an explicit `--config` file must exist
    pub fn load(explicit: Option<&Path>, quiet: bool) -> Result<Self> {
        if let Some(path) = explicit
            && !path.exists()
        {
            return Err(FinError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        Ok(Self {
            config: ConfigLoader::load_with(explicit)?,
            config_path: explicit.map(Path::to_path_buf),
            output: Output::quiet(quiet),
        })
    }

    /// Assistant wired to the configured backend and database
    pub fn assistant(&self) -> Result<FinanceAssistant> {
        FinanceAssistant::from_config(&self.config)
    }
}

/// Current working directory
pub fn project_root() -> Result<PathBuf> {
    Ok(std::env::current_dir()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_explicit_config_is_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");

        let err = CommandContext::load(Some(&missing), true).err().unwrap();
        assert!(matches!(err, FinError::Config(msg) if msg.contains("nope.toml")));
    }

    #[test]
    fn test_explicit_config_is_loaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[server]\nport = 8123\n").unwrap();

        let ctx = CommandContext::load(Some(&path), true).unwrap();
        assert_eq!(ctx.config_path.as_deref(), Some(path.as_path()));
        assert_eq!(ctx.config.server.port, 8123);
    }
}
