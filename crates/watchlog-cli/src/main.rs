use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use commands::{auth, logout, status, sync};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "watchlog")]
#[command(about = "Watchlog - Log your Trakt watch history as Toggl time entries")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true, env = "WATCHLOG_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also write logs to this file, rotated daily
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create time entries for recently watched episodes and movies
    #[command(long_about = "Fetch the Trakt watch history for the lookback window and create one Toggl time entry per item, skipping items that already have an identical entry. Authenticates or refreshes the Trakt token first when needed.")]
    Sync {
        /// Check for duplicates but do not create anything
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,

        /// Lookback window in days (overrides TRAKT_HISTORY_DAYS for this run)
        #[arg(long, value_name = "DAYS")]
        days: Option<u32>,
    },
    /// Authorize watchlog with Trakt using a device code
    #[command(long_about = "Run the Trakt device authorization flow and store the resulting token, replacing any stored token.")]
    Auth,
    /// Show credential state and configuration completeness
    Status,
    /// Delete the stored Trakt token
    Logout,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // .env must be applied before clap reads WATCHLOG_CONFIG
    media_sync_config::Config::load_dotenv().wrap_err("Failed to load .env file")?;

    let cli = Cli::parse();

    logging::init_logging(cli.verbose, cli.quiet, cli.log_file.clone())
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Sync { dry_run, days } => sync::run_sync(dry_run, days, config_path, &output).await,
        Commands::Auth => auth::run_auth(config_path, &output).await,
        Commands::Status => status::run_status(config_path, &output),
        Commands::Logout => logout::run_logout(&output),
    }
}
