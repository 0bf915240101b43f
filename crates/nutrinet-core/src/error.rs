//! Error types for the Nutrinet pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Every failure is fatal to a run; variants carry enough context to point
/// at the offending file, row or identifier.
#[derive(Debug, Error)]
pub enum Error {
    /// A required input file could not be opened.
    #[error("cannot open data file {}: {source}", path.display())]
    DataFormat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A row did not have enough delimited fields.
    #[error("{}:{line}: expected at least {expected} fields, found {found}", path.display())]
    Parse {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },

    /// The delimited reader itself failed part way through a file.
    #[error("error reading {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A nutrient id has no entry in the definitions file.
    #[error("no description for nutrient id {nutrient_id}")]
    Lookup { nutrient_id: String },

    /// The correlation matrix is not a valid adjacency source.
    #[error("invalid correlation matrix: {0}")]
    InvalidMatrix(String),

    /// Creating or writing an output file failed.
    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serde error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for Nutrinet operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
