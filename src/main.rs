//! modcat - concatenate the sources of a multi-module codebase
//!
//! Prints every file below `<base>/<module>/src` for each configured
//! module as a labeled block on standard output, ready to be piped or
//! pasted elsewhere.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Invalid arguments or configuration, or a fatal read/decode error

mod aggregator;
mod cli;
mod config;
mod error;
mod models;
mod scanner;

use aggregator::Aggregator;
use anyhow::{Context, Result};
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use models::RunSummary;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    debug!("modcat v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(&args) {
        Ok(summary) => {
            debug!("Run summary: {:?}", summary);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .modcat.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("Created {} with default settings.", CONFIG_FILE_NAME);
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr; stdout carries only the aggregated output.
/// `RUST_LOG` takes precedence over the verbosity flags.
fn init_logging(args: &Args) {
    let level = args.log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load settings and stream every module to stdout.
fn run(args: &Args) -> Result<RunSummary> {
    let mut config = load_config(args)?;
    config.merge_with_args(args);
    config.validate()?;

    info!(
        "Aggregating {} modules from {}",
        config.aggregator.modules.len(),
        config.aggregator.base_path.display()
    );
    debug!(
        "Missing modules: {}, unreadable files: {}, sorted: {}, follow links: {}",
        config.aggregator.on_missing_module,
        config.aggregator.on_unreadable_file,
        config.aggregator.sort,
        config.aggregator.follow_links
    );

    let aggregator = Aggregator::new(config.aggregator);
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    let result = if args.dry_run {
        aggregator.list(&mut out)
    } else {
        aggregator.run(&mut out)
    };

    // Blocks completed before a failure still reach the terminal
    let flushed = out.flush();
    let summary = result?;
    flushed.context("Failed to flush standard output")?;

    Ok(summary)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
