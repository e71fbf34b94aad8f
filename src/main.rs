use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fintrack::cli::{CommandContext, commands};

#[derive(Parser)]
#[command(name = "fintrack")]
#[command(
    version,
    about = "Personal finance tracker API with AI categorization and chat"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file used instead of ./fintrack.toml
    #[arg(long, short, global = true, env = "FINTRACK_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(long, help = "Bind host (overrides server.host)")]
        host: Option<String>,
        #[arg(long, short, help = "Bind port (overrides server.port)")]
        port: Option<u16>,
    },

    /// Create ./fintrack.toml and the database
    Init {
        #[arg(long, short, help = "Overwrite existing initialization")]
        force: bool,
    },

    /// Categorize a transaction description
    Categorize {
        #[arg(help = "Transaction description")]
        description: String,
    },

    /// Ask the assistant a question about a user's spending
    Ask {
        #[arg(long, short, help = "User id whose transactions give context")]
        user: String,
        #[arg(help = "Question text")]
        question: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'g', long, help = "Show global config file only")]
        global: bool,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Write the default configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mfintrack encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    // Missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Commands::Config {
        action: ConfigAction::Path,
    } = cli.command
    {
        commands::config::path()?;
        return Ok(());
    }

    let ctx = CommandContext::load(cli.config.as_deref(), cli.quiet)?;

    match cli.command {
        Commands::Serve { host, port } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::serve::run(&ctx, host, port))?;
        }
        Commands::Init { force } => {
            commands::init::run(&ctx, force)?;
        }
        Commands::Categorize { description } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::categorize::run(&ctx, &description))?;
        }
        Commands::Ask { user, question } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::ask::run(&ctx, &user, &question))?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { global, format } => {
                commands::config::show(&ctx, global, &format)?;
            }
            ConfigAction::Path => commands::config::path()?,
            ConfigAction::Init { global, force } => {
                commands::config::init(&ctx, global, force)?;
            }
        },
    }

    Ok(())
}
