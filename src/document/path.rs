//! Dotted path syntax
//!
//! A path is a sequence of segments separated by `.`:
//!
//! ```text
//! User            top-level key
//! User.0.element  first array entry, then object key
//! User.-1         append position of the User array (set only)
//! a\.b            a single key containing a literal dot
//! ```
//!
//! Whether a numeric segment is an array index or an object key depends on
//! the container it is applied to.

use super::errors::{DocumentError, DocumentResult};

/// Segment that addresses the position one past the end of an array.
pub const APPEND_SEGMENT: &str = "-1";

/// Splits a dotted path into its segments, honoring `\.` escapes.
///
/// Empty paths and empty segments are rejected.
pub fn split_path(path: &str) -> DocumentResult<Vec<String>> {
    if path.is_empty() {
        return Err(DocumentError::InvalidPath(path.to_string()));
    }

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => current.push(escaped),
                None => return Err(DocumentError::InvalidPath(path.to_string())),
            },
            '.' => {
                if current.is_empty() {
                    return Err(DocumentError::InvalidPath(path.to_string()));
                }
                segments.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }

    if current.is_empty() {
        return Err(DocumentError::InvalidPath(path.to_string()));
    }
    segments.push(current);

    Ok(segments)
}

/// Interprets a segment as an array index.
pub fn as_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Whether a segment, applied to a missing child, should create an array.
pub(crate) fn wants_array(segment: &str) -> bool {
    segment == APPEND_SEGMENT || as_index(segment).is_some()
}
