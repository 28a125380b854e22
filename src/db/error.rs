// Database error types
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// Opening the database failed. Fatal to the session; callers surface
    /// this instead of retrying.
    #[error("failed to open database at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A single statement failed.
    #[error("query failed: {statement}: {source}")]
    Query {
        statement: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A referenced row does not exist. Recoverable; the caller decides.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("backup failed: {0}")]
    Backup(String),

    #[error("restore failed: {0}")]
    Restore(String),
}

impl DbError {
    /// Wrap a failed statement, logging it with the underlying message so
    /// no failure disappears into a default value.
    pub(crate) fn query(statement: &str, source: rusqlite::Error) -> Self {
        log::error!("query failed: {statement}; error: {source}");
        DbError::Query {
            statement: statement.to_string(),
            source,
        }
    }
}
