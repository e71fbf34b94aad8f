//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (platform config dir, e.g. ~/.config/fintrack/config.toml)
//! 3. Project config (./fintrack.toml, or the file given with `--config`)
//! 4. Environment variables (`FINTRACK_` prefix, `__` between nesting levels)

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{FinError, Result};

const ENV_PREFIX: &str = "FINTRACK_";
const PROJECT_CONFIG_FILE: &str = "fintrack.toml";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with the full resolution chain:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        Self::load_with(None)
    }

    /// Like [`load`](Self::load), with an explicit file replacing `./fintrack.toml`
    pub fn load_with(explicit: Option<&Path>) -> Result<Config> {
        let config: Config = Self::figment(explicit)
            .extract()
            .map_err(|e| FinError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file only (no global, no env)
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| FinError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!(path = %global_path.display(), "Loading global config");
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::project_config_path);
        if project_path.exists() {
            debug!(path = %project_path.display(), "Loading project config");
            figment = figment.merge(Toml::file(&project_path));
        }

        // FINTRACK_CHAT__REQUEST_TIMEOUT_SECS -> chat.request_timeout_secs
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Platform config directory for fintrack
    pub fn global_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "fintrack").map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    pub fn project_config_path() -> PathBuf {
        PathBuf::from(PROJECT_CONFIG_FILE)
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Print where configuration is read from
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());
        println!("  Env:     {}<SECTION>__<KEY>", ENV_PREFIX);
    }

    /// Print the effective configuration (secrets omitted)
    pub fn show_config(config: &Config, as_json: bool) -> Result<()> {
        if as_json {
            println!("{}", serde_json::to_string_pretty(config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(config).map_err(|e| FinError::Config(e.to_string()))?
            );
        }

        Ok(())
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Write the default config to the platform config directory
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            FinError::Config("Cannot determine global config directory".to_string())
        })?;
        fs::create_dir_all(&global_dir)?;

        let config_path = global_dir.join("config.toml");
        Self::write_default(&config_path, force)?;
        Ok(config_path)
    }

    /// Write the default config as `fintrack.toml` inside `dir`
    pub fn init_project(dir: &Path, force: bool) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let config_path = dir.join(PROJECT_CONFIG_FILE);
        Self::write_default(&config_path, force)?;
        Ok(config_path)
    }

    fn write_default(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            info!(path = %path.display(), "Config exists, leaving it untouched");
            return Ok(());
        }
        fs::write(path, Self::default_config_toml())?;
        info!(path = %path.display(), "Created config");
        Ok(())
    }

    /// Default config file content (TOML)
    pub fn default_config_toml() -> String {
        r#"# fintrack configuration
# Environment variables override this file: FINTRACK_<SECTION>__<KEY>

[server]
host = "127.0.0.1"
port = 8000

[database]
path = "fintrack.db"
pool_size = 8

[llm]
provider = "gemini"          # gemini | openai
# model = "gemini-flash-latest"
timeout_secs = 60
temperature = 0.2
max_tokens = 1024
# API key: GEMINI_API_KEY / OPENAI_API_KEY, or FINTRACK_LLM__API_KEY

[retry]
max_attempts = 3
base_delay_ms = 2000
max_jitter_ms = 1000

[chat]
request_timeout_secs = 90
history_limit = 20
guidance = ""

[auth]
# Signing secret: SUPABASE_JWT_SECRET or FINTRACK_AUTH__JWT_SECRET

[profile]
default_initial_balance = 5000.0
default_page_size = 100
"#
        .to_string()
    }
}
