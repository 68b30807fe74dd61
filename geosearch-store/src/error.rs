//! Error types for datastore access.

use thiserror::Error;

/// Datastore errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Connection could not be established or is unusable.
    #[error("connection error: {0}")]
    Connection(String),

    /// Query execution failed; carries the datastore's diagnostic.
    #[error("{0}")]
    Query(String),

    /// The connection handle was closed.
    #[error("datastore connection is closed")]
    Closed,

    /// A requested column is not present in the row.
    #[error("column not found: {name}")]
    MissingColumn { name: String },

    /// A column holds a different type than the accessor expects.
    #[error("column {name} has type {actual}, expected {expected}")]
    ColumnType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl StoreError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        StoreError::Connection(msg.into())
    }

    /// Create a query error carrying a datastore diagnostic.
    pub fn query(msg: impl Into<String>) -> Self {
        StoreError::Query(msg.into())
    }

    /// Create a missing-column error.
    pub fn missing_column(name: impl Into<String>) -> Self {
        StoreError::MissingColumn { name: name.into() }
    }
}

/// Result type alias using StoreError.
pub type Result<T> = std::result::Result<T, StoreError>;
