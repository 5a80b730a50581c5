//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.modcat.toml` files. Every setting defaults to the tool's
//! built-in behavior, so a missing or empty file is equivalent to
//! running with no configuration at all.

use crate::models::Policy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".modcat.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Aggregation settings.
    #[serde(default)]
    pub aggregator: AggregatorConfig,
}

/// What to aggregate and how to react to failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Root directory module directories are resolved from.
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,

    /// Module names, in output order.
    #[serde(default = "default_modules")]
    pub modules: Vec<String>,

    /// Emit files in sorted order instead of raw directory order.
    #[serde(default = "default_true")]
    pub sort: bool,

    /// Descend into symlinked directories.
    #[serde(default)]
    pub follow_links: bool,

    /// Reaction to a module without a `src` directory.
    #[serde(default = "default_on_missing_module")]
    pub on_missing_module: Policy,

    /// Reaction to a file or directory that cannot be read or decoded.
    #[serde(default = "default_on_unreadable_file")]
    pub on_unreadable_file: Policy,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            modules: default_modules(),
            sort: true,
            follow_links: false,
            on_missing_module: default_on_missing_module(),
            on_unreadable_file: default_on_unreadable_file(),
        }
    }
}

fn default_base_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_modules() -> Vec<String> {
    vec!["muos-main", "muos-threads", "muos-syscall"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_true() -> bool {
    true
}

fn default_on_missing_module() -> Policy {
    Policy::Skip
}

fn default_on_unreadable_file() -> Policy {
    Policy::Fail
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.modcat.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only explicitly provided values override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref base_path) = args.base_path {
            self.aggregator.base_path = base_path.clone();
        }
        if let Some(ref modules) = args.modules {
            self.aggregator.modules = modules.clone();
        }

        // Flags only ever move away from the defaults
        if args.unsorted {
            self.aggregator.sort = false;
        }
        if args.follow_links {
            self.aggregator.follow_links = true;
        }

        if let Some(policy) = args.on_missing_module {
            self.aggregator.on_missing_module = policy;
        }
        if let Some(policy) = args.on_unreadable_file {
            self.aggregator.on_unreadable_file = policy;
        }
    }

    /// Check settings that the file format alone cannot enforce.
    pub fn validate(&self) -> Result<()> {
        if let Some(index) = self.aggregator.modules.iter().position(|m| m.trim().is_empty()) {
            anyhow::bail!("Module name at position {} is empty", index + 1);
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
