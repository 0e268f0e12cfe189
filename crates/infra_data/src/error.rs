//! Data loading error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading source tables or policy documents
#[derive(Debug, Error)]
pub enum DataError {
    /// A file or directory could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A table could not be parsed
    #[error("Malformed table {table}: {source}")]
    Csv {
        table: String,
        #[source]
        source: csv::Error,
    },
}

impl DataError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DataError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(table: impl Into<String>, source: csv::Error) -> Self {
        DataError::Csv {
            table: table.into(),
            source,
        }
    }

    /// Checks if this error is a missing file or directory
    pub fn is_missing(&self) -> bool {
        matches!(self, DataError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
