//! Data models for the aggregator.
//!
//! This module contains the small set of types shared between the
//! scanner, the aggregator and the CLI: failure policies, the ephemeral
//! file record and the run summary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Reaction to a class of failure encountered during a run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Stop the whole run with an error
    Fail,
    /// Log a warning (or nothing, for missing modules) and carry on
    Skip,
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Fail => write!(f, "fail"),
            Policy::Skip => write!(f, "skip"),
        }
    }
}

/// A single file read from a module, ready to be emitted.
///
/// Records are produced one at a time and dropped as soon as their
/// block has been written.
#[derive(Debug, PartialEq, Eq)]
pub struct FileRecord {
    /// Path as displayed in the header (base path joined with module/src/...).
    pub path: PathBuf,
    /// Decoded contents, verbatim.
    pub contents: String,
}

/// Counters collected over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Modules whose source directory existed and was walked.
    pub modules_visited: usize,
    /// Modules without a source directory.
    pub modules_missing: usize,
    /// Files whose block was written.
    pub files_emitted: usize,
    /// Files or directories passed over under the skip policy.
    pub entries_skipped: usize,
}

impl RunSummary {
    /// Total number of modules considered.
    pub fn modules_total(&self) -> usize {
        self.modules_visited + self.modules_missing
    }
}
