//! Error types for the data-loader crate.
//!
//! Every failure while reading the feature or rating files surfaces as one
//! of these variants. Nothing partially built is handed back alongside an
//! error.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while ingesting feature and rating files
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// The file could not be opened or read to the end
    ///
    /// Covers missing files, permission problems and invalid UTF-8.
    #[error("Failed to ingest {}: {source}", .path.display())]
    Ingestion {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Line in a data file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    Parse {
        file: String,
        line: usize,
        reason: String,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Referenced entity doesn't exist (e.g., a rating for an item with no feature line)
    #[error("Missing reference: {entity} with label {label}")]
    MissingReference { entity: String, label: String },
}

impl DataLoadError {
    /// True for I/O level failures, as opposed to content problems
    pub fn is_ingestion(&self) -> bool {
        matches!(self, DataLoadError::Ingestion { .. })
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
