//! Error types for the SQLite session.

use std::path::PathBuf;

use thiserror::Error;

use tasklane_core::StoreError;

/// Errors raised by [`SqliteSession`](crate::SqliteSession).
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// A statement failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to open database '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to create database directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The schema could not be brought up to date.
    #[error("migration to schema version {version} failed: {source}")]
    Migration {
        version: i64,
        #[source]
        source: rusqlite::Error,
    },

    /// Neither the config nor the platform provide a database path.
    #[error("no database path configured")]
    NoDatabasePath,
}

/// Result type for SQLite session operations.
pub type Result<T> = std::result::Result<T, SqliteStoreError>;

impl From<SqliteStoreError> for StoreError {
    fn from(err: SqliteStoreError) -> Self {
        StoreError::with_source(err.to_string(), err)
    }
}

impl From<SqliteStoreError> for tasklane_core::Error {
    fn from(err: SqliteStoreError) -> Self {
        tasklane_core::Error::Store(err.into())
    }
}
