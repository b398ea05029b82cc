//! # Store Error Types
//!
//! Error types for storage operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  CoreError (business rule)    io::Error / csv::Error (storage)         │
//! │       │                              │                                  │
//! │       └──────────────┬───────────────┘                                  │
//! │                      ▼                                                  │
//! │  StoreError (this module) ← Adds table / path context                  │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │  API layer maps kind() to a response                                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};

use stockroom_core::{CoreError, ErrorKind};
use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A business rule rejected the operation. Nothing was written.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Reading, writing or renaming a file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader or writer failed (bad quoting, ragged rows).
    #[error("CSV error in {table}: {source}")]
    Csv {
        table: &'static str,
        #[source]
        source: csv::Error,
    },

    /// The header row does not match the expected columns.
    ///
    /// ## When This Occurs
    /// - Table written by an older layout that was never migrated
    /// - File edited by hand with columns reordered
    #[error("{table} needs migration: expected columns [{expected}], found [{found}]")]
    SchemaMismatch {
        table: &'static str,
        expected: String,
        found: String,
    },

    /// A row parsed as CSV but a field is not valid for its column.
    #[error("Corrupt row at line {line} of {table}: {reason}")]
    Corrupt {
        table: &'static str,
        line: u64,
        reason: String,
    },

    /// The commit journal names something that is not a known table.
    #[error("Commit journal is invalid: {0}")]
    Journal(String),

    /// Configuration could not be loaded or failed validation.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl StoreError {
    /// Builds a closure that wraps an `io::Error` with the path it concerns.
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError {
        let path = path.to_path_buf();
        move |source| StoreError::Io { path, source }
    }

    /// Domain errors report their taxonomy bucket. Storage faults return `None`.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            StoreError::Domain(err) => Some(err.kind()),
            _ => None,
        }
    }

    /// Returns the domain error, if this is one.
    pub fn as_domain(&self) -> Option<&CoreError> {
        match self {
            StoreError::Domain(err) => Some(err),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for StoreError {
    fn from(err: toml::de::Error) -> Self {
        StoreError::Config(err.to_string())
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;
