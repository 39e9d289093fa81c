//! docgate CLI
//!
//! Main entry point for the docgate command-line tool.
//! Answers questions over company documents, restricted to what a role may read.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{AskCommand, LoadCommand, RolesCommand, StatsCommand};
use docgate_core::{config::AppConfig, logging};
use std::path::PathBuf;

/// docgate - role-filtered question answering over company documents
#[derive(Parser, Debug)]
#[command(name = "docgate")]
#[command(about = "Role-filtered question answering over company documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "DOCGATE_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "DOCGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generation provider (ollama, openrouter)
    #[arg(short, long, global = true, env = "DOCGATE_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "DOCGATE_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a question as a role
    Ask(AskCommand),

    /// Load precomputed chunks into the vector store
    Load(LoadCommand),

    /// Show vector store statistics
    Stats(StatsCommand),

    /// Show which roles can read which content
    Roles(RolesCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment
    let mut config = AppConfig::load()?;

    // An explicit --config file is merged before the remaining flags
    if let Some(path) = &cli.config {
        config = config
            .merge_yaml(path)
            .with_context(|| format!("loading config file {}", path.display()))?;
    }

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("docgate starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.ensure_docgate_dir()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Load(_) => "load",
        Commands::Stats(_) => "stats",
        Commands::Roles(_) => "roles",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Load(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
        Commands::Roles(cmd) => cmd.execute(),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {:#}", e),
    }

    result
}
