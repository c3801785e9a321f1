//! Error types for the sync engine.

use thiserror::Error;

/// Main error type for replication/load operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Configuration error (invalid YAML, missing fields, unknown tier, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A source column type the mapper cannot translate.
    ///
    /// Fatal for the table, never retried, never aborts sibling tables.
    #[error("Unsupported source type '{data_type}' for {table}.{column}")]
    UnsupportedType {
        table: String,
        column: String,
        data_type: String,
    },

    /// Database connection or query error with context.
    #[error("Store error: {message}\n  Context: {context}")]
    Store { message: String, context: String },

    /// Connection pool error.
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// Copy failed for a specific table.
    #[error("Copy failed for table {table}: {message}")]
    Copy { table: String, message: String },

    /// A table copy exceeded its duration budget.
    #[error("Table {table} exceeded its copy budget of {budget_secs}s")]
    Timeout { table: String, budget_secs: u64 },

    /// The batch was cancelled before this table started.
    #[error("Batch cancelled")]
    Cancelled,

    /// Tracker state error.
    #[error("Tracker error: {0}")]
    Tracker(String),

    /// IO error (config file operations).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<tokio_postgres::Error> for SyncError {
    fn from(e: tokio_postgres::Error) -> Self {
        SyncError::Store {
            message: e.to_string(),
            context: "postgres".into(),
        }
    }
}

impl From<deadpool_postgres::PoolError> for SyncError {
    fn from(e: deadpool_postgres::PoolError) -> Self {
        SyncError::Pool {
            message: e.to_string(),
            context: "acquiring connection".into(),
        }
    }
}

impl SyncError {
    /// Create a Store error with context about where it occurred.
    pub fn store(message: impl Into<String>, context: impl Into<String>) -> Self {
        SyncError::Store {
            message: message.into(),
            context: context.into(),
        }
    }

    /// Create a Pool error with context.
    pub fn pool(message: impl ToString, context: impl Into<String>) -> Self {
        SyncError::Pool {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a Copy error.
    pub fn copy(table: impl Into<String>, message: impl Into<String>) -> Self {
        SyncError::Copy {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Whether the chunk retry loop should attempt this operation again.
    ///
    /// Connection drops and pool exhaustion are retryable; configuration and
    /// mapping errors are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, SyncError::Store { .. } | SyncError::Pool { .. })
    }
}

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(SyncError::store("conn reset", "reading chunk").is_transient());
        assert!(SyncError::pool("timed out", "warehouse pool").is_transient());
        assert!(!SyncError::Config("bad tier".into()).is_transient());
        assert!(!SyncError::UnsupportedType {
            table: "person".into(),
            column: "photo".into(),
            data_type: "geometry".into(),
        }
        .is_transient());
        assert!(!SyncError::copy("person", "writer failed").is_transient());
    }

    #[test]
    fn test_unsupported_type_message() {
        let err = SyncError::UnsupportedType {
            table: "obs".into(),
            column: "value_complex".into(),
            data_type: "geometry".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("obs.value_complex"));
        assert!(msg.contains("geometry"));
    }
}
