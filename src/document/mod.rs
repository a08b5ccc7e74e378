//! Document engine
//!
//! Holds the whole persisted state as a single JSON object and offers
//! path-scoped reads and mutations over it. Paths use the dotted syntax
//! described in [`path`].
//!
//! # Invariants
//!
//! - The root is always a JSON object. Parsing anything else fails.
//! - Mutations never leave a partially applied path behind on error,
//!   except for intermediate containers created before a type mismatch.
//! - Deleting a missing path is not an error.

mod errors;
pub mod path;

pub use errors::{DocumentError, DocumentResult};

use serde_json::{Map, Value};

pub(crate) use errors::kind_of;
use path::{as_index, split_path, wants_array, APPEND_SEGMENT};

/// A JSON object document with dotted-path access.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    root: Map<String, Value>,
}

impl Document {
    /// Creates an empty document (`{}`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses document text.
    ///
    /// Blank text yields an empty document. Text whose root is not a JSON
    /// object fails with [`DocumentError::NotAnObject`].
    pub fn parse(text: &str) -> DocumentResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::new());
        }

        match serde_json::from_str::<Value>(text)? {
            Value::Object(root) => Ok(Self { root }),
            other => Err(DocumentError::NotAnObject {
                found: kind_of(&other),
            }),
        }
    }

    /// Read-only access to the root object.
    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    /// Top-level keys in insertion order (the order they appear in the file).
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.root.keys().map(String::as_str)
    }

    /// Resolves a path to a value, if present.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let segments = split_path(path).ok()?;
        let (first, rest) = segments.split_first()?;
        let mut current = self.root.get(first)?;
        for segment in rest {
            current = child(current, segment)?;
        }
        Some(current)
    }

    /// Length of the array at `path`, or 0 when the path is missing or not
    /// an array.
    pub fn array_len(&self, path: &str) -> usize {
        self.get(path)
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// Sets the value at `path`, creating missing intermediate containers.
    ///
    /// A missing child becomes an array when the following segment is an
    /// index or `-1`, otherwise an object. An array index may replace an
    /// existing entry or address the position right after the last one;
    /// anything further is `IndexOutOfBounds`. `-1` on an object is a type
    /// mismatch, never a key.
    pub fn set(&mut self, path: &str, value: Value) -> DocumentResult<()> {
        let segments = split_path(path)?;
        let Some((last, parents)) = segments.split_last() else {
            return Err(DocumentError::InvalidPath(path.to_string()));
        };

        let Some((first, middle)) = parents.split_first() else {
            self.root.insert(last.clone(), value);
            return Ok(());
        };

        let next = middle.first().unwrap_or(last);
        let mut current = self
            .root
            .entry(first.clone())
            .or_insert_with(|| empty_container(next));

        for (i, segment) in middle.iter().enumerate() {
            let next = middle.get(i + 1).unwrap_or(last);
            current = descend(current, segment, next, path)?;
        }

        assign(current, last, value, path)
    }

    /// Appends `value` to the array at `path`, creating it if absent.
    pub fn append(&mut self, path: &str, value: Value) -> DocumentResult<()> {
        self.set(&format!("{}.{}", path, APPEND_SEGMENT), value)
    }

    /// Removes the value at `path`, returning it.
    ///
    /// Returns `Ok(None)` when nothing exists at the path.
    pub fn delete(&mut self, path: &str) -> DocumentResult<Option<Value>> {
        let segments = split_path(path)?;
        let Some((last, parents)) = segments.split_last() else {
            return Err(DocumentError::InvalidPath(path.to_string()));
        };

        let Some((first, middle)) = parents.split_first() else {
            return Ok(self.root.shift_remove(last));
        };

        let mut current = match self.root.get_mut(first) {
            Some(value) => value,
            None => return Ok(None),
        };
        for segment in middle {
            current = match child_mut(current, segment) {
                Some(value) => value,
                None => return Ok(None),
            };
        }

        Ok(match current {
            Value::Object(map) => map.shift_remove(last),
            Value::Array(items) => match as_index(last) {
                Some(index) if index < items.len() => Some(items.remove(index)),
                _ => None,
            },
            _ => None,
        })
    }

    /// Renders the document as JSON text.
    pub fn to_text(&self, pretty: bool) -> DocumentResult<String> {
        let text = if pretty {
            serde_json::to_string_pretty(&self.root)?
        } else {
            serde_json::to_string(&self.root)?
        };
        Ok(text)
    }
}

/// Resolves a dotted path relative to an arbitrary JSON value.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let segments = split_path(path).ok()?;
    let mut current = value;
    for segment in &segments {
        current = child(current, segment)?;
    }
    Some(current)
}

fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => items.get(as_index(segment)?),
        _ => None,
    }
}

fn child_mut<'a>(value: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => items.get_mut(as_index(segment)?),
        _ => None,
    }
}

fn empty_container(next_segment: &str) -> Value {
    if wants_array(next_segment) {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

fn mismatch(path: &str, segment: &str, found: &'static str) -> DocumentError {
    DocumentError::TypeMismatch {
        path: path.to_string(),
        segment: segment.to_string(),
        found,
    }
}

/// Resolves an array segment to an existing index or the append position.
fn array_position(len: usize, segment: &str, path: &str) -> DocumentResult<usize> {
    if segment == APPEND_SEGMENT {
        return Ok(len);
    }
    let index = as_index(segment).ok_or_else(|| mismatch(path, segment, "array"))?;
    if index > len {
        return Err(DocumentError::IndexOutOfBounds {
            path: path.to_string(),
            index,
            len,
        });
    }
    Ok(index)
}

fn descend<'a>(
    current: &'a mut Value,
    segment: &str,
    next: &str,
    path: &str,
) -> DocumentResult<&'a mut Value> {
    match current {
        Value::Object(_) if segment == APPEND_SEGMENT => Err(mismatch(path, segment, "object")),
        Value::Object(map) => Ok(map
            .entry(segment.to_string())
            .or_insert_with(|| empty_container(next))),
        Value::Array(items) => {
            let index = array_position(items.len(), segment, path)?;
            if index == items.len() {
                items.push(empty_container(next));
            }
            Ok(&mut items[index])
        }
        other => Err(mismatch(path, segment, kind_of(other))),
    }
}

fn assign(target: &mut Value, segment: &str, value: Value, path: &str) -> DocumentResult<()> {
    match target {
        Value::Object(_) if segment == APPEND_SEGMENT => Err(mismatch(path, segment, "object")),
        Value::Object(map) => {
            map.insert(segment.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            let index = array_position(items.len(), segment, path)?;
            if index == items.len() {
                items.push(value);
            } else {
                items[index] = value;
            }
            Ok(())
        }
        other => Err(mismatch(path, segment, kind_of(other))),
    }
}
