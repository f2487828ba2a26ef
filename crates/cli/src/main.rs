//! Docintel CLI
//!
//! Main entry point for the docintel command-line tool.
//! Embeds parsed document pages, loads them into a search index and answers
//! questions from them with page citations.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, EmbedCommand, IndexCommand, RetrieveCommand};
use docintel_core::{
    config::AppConfig,
    logging::{self, LogFormat},
    AppResult,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Docintel - question answering over scanned documents
#[derive(Parser, Debug)]
#[command(name = "docintel")]
#[command(about = "Question answering over scanned documents with page citations", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "DOCINTEL_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "DOCINTEL_CONFIG")]
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

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Embed parsed page files into embedding records
    Embed(EmbedCommand),

    /// Upload embedding records to the search index
    Index(IndexCommand),

    /// Show the chunks a question would be answered from
    Retrieve(RetrieveCommand),

    /// Ask a question about the documents
    Ask(AskCommand),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    // Flags win over the environment for workspace and config file lookup
    let workspace = cli.workspace.clone();
    let config_file = cli.config.clone();
    let config = AppConfig::load_with(|key| match key {
        "DOCINTEL_WORKSPACE" => workspace
            .as_ref()
            .map(|p| p.display().to_string())
            .or_else(|| std::env::var(key).ok()),
        "DOCINTEL_CONFIG" => config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .or_else(|| std::env::var(key).ok()),
        _ => std::env::var(key).ok(),
    })?;

    // Apply CLI overrides
    let mut config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );
    config.log_json |= cli.log_json;

    // Initialize logging with final configuration
    let format = if config.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    logging::init_logging(config.log_level.as_deref(), config.no_color, format)?;

    tracing::info!("Docintel CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!(
        "Embedding: {} ({}), search: {}, completion: {}",
        config.embedding.provider,
        config.embedding.model,
        config.search.backend,
        config.completion.provider
    );

    config.validate()?;
    config.ensure_docintel_dir()?;

    let command_name = match &cli.command {
        Commands::Embed(_) => "embed",
        Commands::Index(_) => "index",
        Commands::Retrieve(_) => "retrieve",
        Commands::Ask(_) => "ask",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Embed(cmd) => cmd.execute(&config).await,
        Commands::Index(cmd) => cmd.execute(&config).await,
        Commands::Retrieve(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
