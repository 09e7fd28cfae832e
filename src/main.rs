//! AgencyDesk - client, subscription and value tracking for small agencies
//!
//! A CLI over a JSON data file that computes the agency dashboard (MRR,
//! active clients, at-risk subscriptions, new clients this month) and
//! lists, searches and edits clients, subscriptions and the value journal.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, data file, validation, unknown record, etc.)
//!   2 - `dashboard --fail-on-at-risk` found at-risk subscriptions

mod analysis;
mod cli;
mod commands;
mod config;
mod context;
mod error;
mod forms;
mod models;
mod report;
mod store;

use anyhow::{Context, Result};
use cli::{Args, Command};
use config::{Config, DEFAULT_CONFIG_FILE};
use std::path::Path;
use store::JsonStore;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        return handle_init_config(args.config.as_deref());
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, &config)?;

    info!("AgencyDesk v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle init-config: generate a default .agencydesk.toml.
fn handle_init_config(path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            path.display()
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("✅ Created {} with default settings.", path.display());
    println!("   Edit it to set the data file, acting user and display options.");
    Ok(())
}

/// Initialize logging based on verbosity settings. Logs go to stderr so
/// JSON output on stdout stays parseable.
fn init_logging(args: &Args, config: &Config) -> Result<()> {
    let level = if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Run the selected command. Returns the exit code.
async fn run(args: Args, config: Config) -> Result<i32> {
    let data_path = config.data_path();
    debug!("Data file: {}", data_path.display());

    let store = JsonStore::open(&data_path)
        .await
        .with_context(|| format!("Failed to open data file {}", data_path.display()))?;

    let outcome = commands::execute(&store, &config, args.command).await?;
    print!("{}", outcome.output);
    if !outcome.output.ends_with('\n') {
        println!();
    }

    if outcome.exit_code != 0 {
        eprintln!("\n⛔ At-risk subscriptions found. Failing (exit code {}).", outcome.exit_code);
    }
    Ok(outcome.exit_code)
}

/// Load configuration from file or use defaults, then apply CLI overrides.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match args.config {
        // Try explicit config path
        Some(ref config_path) => Config::load(config_path)?,
        // Try default location
        None => match Config::load_default() {
            Ok(Some(config)) => config,
            Ok(None) => Config::default(),
            Err(e) => {
                eprintln!("⚠️  Ignoring {}: {:#}", DEFAULT_CONFIG_FILE, e);
                Config::default()
            }
        },
    };

    config.merge_with_args(args);
    Ok(config)
}
