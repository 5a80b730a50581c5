//! Error types for a single aggregation run.

use std::io;
use std::path::PathBuf;
use std::string::FromUtf8Error;
use thiserror::Error;

/// Failure raised while aggregating module sources.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// A module has no source directory and missing modules are fatal.
    #[error("module '{module}' has no source directory at {}", .path.display())]
    MissingModule { module: String, path: PathBuf },

    /// A directory under a module could not be enumerated.
    #[error("failed to walk {}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A file could not be opened or read.
    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A file is not valid UTF-8.
    #[error("failed to decode {} as UTF-8", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: FromUtf8Error,
    },

    /// The output sink rejected a write.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl AggregateError {
    /// Whether the skip policy may pass over this error.
    ///
    /// Missing modules have their own policy and output failures are
    /// always fatal.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            AggregateError::Walk { .. } | AggregateError::Read { .. } | AggregateError::Decode { .. }
        )
    }
}
