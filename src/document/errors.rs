//! Document engine error types

use thiserror::Error;

/// Result type for document engine operations
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Errors raised while parsing or mutating a document
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("document root is not a JSON object (found {found})")]
    NotAnObject { found: &'static str },

    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    #[error("cannot descend into {found} at segment {segment:?} of path {path:?}")]
    TypeMismatch {
        path: String,
        segment: String,
        found: &'static str,
    },

    #[error("array index {index} past the end (len {len}) in path {path:?}")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },
}

/// Human-readable name of a JSON value's kind, used in error messages
pub(crate) fn kind_of(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
