//! Store error taxonomy
//!
//! Error codes:
//! - FLATDOC_INVALID_DATABASE_FILE (FATAL severity)
//! - FLATDOC_STORAGE_READ_FAILED (FATAL severity)
//! - FLATDOC_INVALID_ARGUMENT (ERROR severity)
//! - FLATDOC_SERIALIZATION_FAILED (ERROR severity)
//! - FLATDOC_DESERIALIZATION_FAILED (ERROR severity)
//! - FLATDOC_STORAGE_WRITE_FAILED (ERROR severity)
//! - FLATDOC_NOT_FOUND (ERROR severity)
//!
//! Nothing is retried internally. A fatal error means the store could not be
//! opened at all; every other error leaves the store usable.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Severity levels for store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, store remains usable
    Error,
    /// The store cannot be used
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Result type for store operations
pub type DbResult<T> = Result<T, DbError>;

/// Errors returned by [`Store`](crate::Store) operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// The backing file is non-empty and does not hold a JSON object.
    #[error("invalid database file {}: {reason}", .path.display())]
    InvalidDatabaseFile { path: PathBuf, reason: String },

    /// The backing file could not be created or read.
    #[error("failed to read database file {}: {source}", .path.display())]
    StorageRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A value or name does not have the shape the operation requires.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to serialize {collection} value: {source}")]
    Serialization {
        collection: String,
        #[source]
        source: serde_json::Error,
    },

    /// Decoding a stored element into the requested type failed.
    #[error("failed to deserialize {collection} record at position {position}: {source}")]
    Deserialization {
        collection: String,
        position: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Updating the document or writing the backing file failed.
    ///
    /// Persistence state is unknown after this error; reopen to resync.
    #[error("storage write failed: {reason}")]
    StorageWrite {
        reason: String,
        #[source]
        source: Option<io::Error>,
    },

    /// No record satisfied the lookup.
    #[error("no matching record in collection {collection}")]
    NotFound { collection: String },
}

impl DbError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        DbError::InvalidArgument(message.into())
    }

    pub(crate) fn write_failed(reason: impl Into<String>, source: io::Error) -> Self {
        DbError::StorageWrite {
            reason: reason.into(),
            source: Some(source),
        }
    }

    pub(crate) fn mutation_failed(reason: impl Into<String>) -> Self {
        DbError::StorageWrite {
            reason: reason.into(),
            source: None,
        }
    }

    /// Stable string code for this error
    pub fn code(&self) -> &'static str {
        match self {
            DbError::InvalidDatabaseFile { .. } => "FLATDOC_INVALID_DATABASE_FILE",
            DbError::StorageRead { .. } => "FLATDOC_STORAGE_READ_FAILED",
            DbError::InvalidArgument(_) => "FLATDOC_INVALID_ARGUMENT",
            DbError::Serialization { .. } => "FLATDOC_SERIALIZATION_FAILED",
            DbError::Deserialization { .. } => "FLATDOC_DESERIALIZATION_FAILED",
            DbError::StorageWrite { .. } => "FLATDOC_STORAGE_WRITE_FAILED",
            DbError::NotFound { .. } => "FLATDOC_NOT_FOUND",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            DbError::InvalidDatabaseFile { .. } | DbError::StorageRead { .. } => Severity::Fatal,
            _ => Severity::Error,
        }
    }

    /// Returns whether the store could not be opened because of this error
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }
}
