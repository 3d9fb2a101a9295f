use salesreport_core::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Report file not found: {0}")]
    MissingReport(PathBuf),
    #[error("Cannot tell which month {0} covers")]
    UnknownPeriod(PathBuf),
    #[error("Outbox copy of {0} does not match the report")]
    CopyMismatch(PathBuf),
    #[error("Corrupt distribution row {id}: {reason}")]
    Corrupt { id: i64, reason: String },
}

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::StorageError
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}
