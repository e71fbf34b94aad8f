//! Config Command
//!
//! Usage:
//!   fintrack config show [-g] [-f json]
//!   fintrack config path
//!   fintrack config init [-g] [--force]

use crate::cli::CommandContext;
use crate::config::ConfigLoader;
use crate::types::Result;

/// Show the effective configuration, or the raw global file with `global`
pub fn show(ctx: &CommandContext, global: bool, format: &str) -> Result<()> {
    if !global {
        return ConfigLoader::show_config(&ctx.config, format == "json");
    }

    match ConfigLoader::global_config_path() {
        Some(path) if path.exists() => {
            let content = std::fs::read_to_string(&path)?;
            println!("# Global Config: {}\n", path.display());
            println!("{}", content);
        }
        Some(_) => {
            ctx.output.warning("No global config found.");
            ctx.output
                .info("Run 'fintrack config init --global' to create one.");
        }
        None => ctx.output.error("Cannot determine global config directory."),
    }
    Ok(())
}

pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

/// Write the default config globally or into the current directory
pub fn init(ctx: &CommandContext, global: bool, force: bool) -> Result<()> {
    let path = if global {
        ConfigLoader::init_global(force)?
    } else {
        ConfigLoader::init_project(&crate::cli::project_root()?, force)?
    };

    ctx.output.success("Configuration ready");
    ctx.output.detail("Config", &path.display().to_string());
    Ok(())
}
