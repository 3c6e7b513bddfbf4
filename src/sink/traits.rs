//! Record sink trait and error types

use crate::extract::Record;
use thiserror::Error;

/// Errors that can occur while persisting records
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Table '{0}' does not exist")]
    MissingTable(String),

    #[error("Invalid sink configuration: {0}")]
    Invalid(String),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Trait for record sink implementations
pub trait RecordSink: Send {
    /// Persists a batch of records
    ///
    /// # Returns
    ///
    /// The number of records actually persisted
    fn write(&mut self, records: &[Record]) -> SinkResult<usize>;
}
