//! Module source discovery.
//!
//! This module resolves a module's `src` directory and walks it,
//! yielding every non-directory entry in the configured order.

use crate::config::AggregatorConfig;
use crate::error::AggregateError;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Name of the per-module directory that gets aggregated.
pub const SOURCE_DIR: &str = "src";

/// Configuration for walking a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// Order each group of a directory by name instead of enumeration order
    pub sort: bool,
    /// Descend into symlinked directories
    pub follow_links: bool,
}

impl From<&AggregatorConfig> for ScanConfig {
    fn from(config: &AggregatorConfig) -> Self {
        Self {
            sort: config.sort,
            follow_links: config.follow_links,
        }
    }
}

/// Walks module source trees under a base path.
pub struct ModuleScanner {
    config: ScanConfig,
    base_path: PathBuf,
}

impl ModuleScanner {
    /// Create a new module scanner.
    pub fn new(base_path: PathBuf, config: ScanConfig) -> Self {
        Self { config, base_path }
    }

    /// `<base>/<module>/src`
    pub fn source_root(&self, module: &str) -> PathBuf {
        self.base_path.join(module).join(SOURCE_DIR)
    }

    /// Iterate over every file below `root`.
    ///
    /// A directory's own files always come before anything from its
    /// subdirectories; `sort` only decides the order inside each group.
    /// Paths are `root` joined with the entry's relative path. Directory
    /// enumeration failures are yielded in place and the walk continues
    /// with the remaining entries.
    pub fn files(&self, root: &Path) -> impl Iterator<Item = Result<PathBuf, AggregateError>> {
        let sort = self.config.sort;
        // Stable sort: without `sort`, each group keeps enumeration order
        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(self.config.follow_links)
            .sort_by(move |a, b| {
                let by_kind = a.file_type().is_dir().cmp(&b.file_type().is_dir());
                if sort {
                    by_kind.then_with(|| a.file_name().cmp(b.file_name()))
                } else {
                    by_kind
                }
            });

        let root = root.to_path_buf();
        walker.into_iter().filter_map(move |entry| match entry {
            Ok(entry) if is_directory(&entry) => None,
            Ok(entry) => Some(Ok(entry.into_path())),
            Err(source) => {
                let path = source
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.clone());
                Some(Err(AggregateError::Walk { path, source }))
            }
        })
    }

    /// Collect every file of a module, or `None` if it has no source directory.
    #[cfg(test)]
    pub fn list(&self, module: &str) -> Option<Result<Vec<PathBuf>, AggregateError>> {
        let root = self.source_root(module);
        if !root.is_dir() {
            return None;
        }
        Some(self.files(&root).collect())
    }
}

/// Directories are walked, never emitted.
///
/// A symlinked directory that is not being followed is passed over
/// entirely rather than read as a file.
fn is_directory(entry: &DirEntry) -> bool {
    if entry.file_type().is_dir() {
        return true;
    }
    if entry.path_is_symlink() && entry.path().is_dir() {
        debug!("Not following symlinked directory {}", entry.path().display());
        return true;
    }
    false
}
