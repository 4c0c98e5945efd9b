//! Error types for the store.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite (malformed SQL, constraint violation, ...).
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A table, column or ordering term failed the identifier allow-list.
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// An insert or update was requested with no fields.
    #[error("no fields supplied for {0}")]
    EmptyFields(String),

    /// A bulk insert row named a column the first row did not.
    #[error("column {column:?} is not among the columns of the first row for {table}")]
    UnexpectedColumn { table: String, column: String },
}
