//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::Policy;
use clap::Parser;
use std::path::PathBuf;

/// modcat - concatenate the sources of a multi-module codebase
///
/// Walks `<base>/<module>/src` for every module, in order, and prints
/// each file as a `--- <path> ---` header followed by its contents and a
/// blank line. With no arguments the built-in module list is used.
///
/// Examples:
///   modcat
///   modcat --modules core,cli,server > all_sources.txt
///   modcat --base-path ../workspace --on-unreadable-file skip
///   modcat --dry-run
///   modcat --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Root directory module directories are resolved from
    ///
    /// Defaults to the current directory (or the config file value).
    #[arg(short, long, value_name = "DIR", env = "MODCAT_BASE_PATH")]
    pub base_path: Option<PathBuf>,

    /// Modules to aggregate, in output order (comma-separated)
    ///
    /// Example: --modules muos-main,muos-threads
    #[arg(short, long, value_name = "NAMES", value_delimiter = ',')]
    pub modules: Option<Vec<String>>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .modcat.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Keep directory enumeration order instead of sorting by name
    ///
    /// A directory's files are still emitted before its subdirectories.
    #[arg(long)]
    pub unsorted: bool,

    /// Descend into symlinked directories
    #[arg(long)]
    pub follow_links: bool,

    /// What to do when a module has no src directory
    #[arg(long, value_name = "POLICY")]
    pub on_missing_module: Option<Policy>,

    /// What to do when a file cannot be read or is not valid UTF-8
    #[arg(long, value_name = "POLICY")]
    pub on_unreadable_file: Option<Policy>,

    /// List the files that would be emitted, without their contents
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .modcat.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref modules) = self.modules {
            if modules.iter().any(|m| m.trim().is_empty()) {
                return Err("Module names must not be empty".to_string());
            }
        }

        // Validate base path if provided
        if let Some(ref base_path) = self.base_path {
            if !base_path.exists() {
                return Err(format!(
                    "Base path does not exist: {}",
                    base_path.display()
                ));
            }
            if !base_path.is_dir() {
                return Err(format!(
                    "Base path is not a directory: {}",
                    base_path.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// The default is `WARN` so that a normal run keeps stderr empty.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        }
    }
}
