//! Record codec
//!
//! Converts application values to and from their stored JSON form.
//!
//! A type becomes storable by implementing [`Entity`], which names the
//! collection its records live in. The [`entity!`](crate::entity) macro
//! implements it from the unqualified type name:
//!
//! ```ignore
//! #[derive(Serialize, Deserialize)]
//! struct User { name: String }
//!
//! flatdoc::entity!(User);            // collection "User"
//! flatdoc::entity!(Book, "library"); // explicit collection name
//! ```
//!
//! Collection membership is purely name based: two types registered under
//! the same name share one collection.

pub mod checksum;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::kind_of;
use crate::errors::{DbError, DbResult};

pub use checksum::fingerprint;

/// A value that can be stored in a collection.
pub trait Entity: Serialize + DeserializeOwned {
    /// Name of the collection that holds records of this type.
    const COLLECTION: &'static str;
}

/// Implements [`Entity`] for a type.
///
/// With a single argument the collection is named after the type itself.
#[macro_export]
macro_rules! entity {
    ($ty:ident) => {
        $crate::entity!($ty, stringify!($ty));
    };
    ($ty:ty, $name:expr) => {
        impl $crate::Entity for $ty {
            const COLLECTION: &'static str = $name;
        }
    };
}

/// Stored wrapper around one saved value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T = Value> {
    /// The serialized application value
    pub element: T,
    /// Insertion time, whole seconds since the Unix epoch
    pub inserted_at: i64,
    /// Fingerprint of the serialized element
    pub hash: String,
}

/// Checks that a collection name can be used as a top-level path segment.
pub fn validate_collection_name(name: &str) -> DbResult<()> {
    if name.is_empty() {
        return Err(DbError::invalid_argument("collection name must not be empty"));
    }
    if name
        .chars()
        .any(|c| c == '.' || c == '\\' || c.is_whitespace() || c.is_control())
    {
        return Err(DbError::invalid_argument(format!(
            "collection name {:?} must not contain '.', '\\' or whitespace",
            name
        )));
    }
    Ok(())
}

/// Wraps `value` into a record stamped with `inserted_at`.
///
/// The value must serialize to a JSON object; primitives, sequences and
/// unit values are rejected with `InvalidArgument`.
pub fn encode<T: Entity>(value: &T, inserted_at: i64) -> DbResult<Record> {
    validate_collection_name(T::COLLECTION)?;

    let element = serde_json::to_value(value).map_err(|source| DbError::Serialization {
        collection: T::COLLECTION.to_string(),
        source,
    })?;

    if !element.is_object() {
        return Err(DbError::invalid_argument(format!(
            "expected a single record value, got {}",
            kind_of(&element)
        )));
    }

    let serialized = serde_json::to_string(&element).map_err(|source| DbError::Serialization {
        collection: T::COLLECTION.to_string(),
        source,
    })?;

    Ok(Record {
        hash: fingerprint(&serialized),
        element,
        inserted_at,
    })
}

/// Decodes a stored element into `T`.
///
/// `position` is the record's index in its collection, reported on failure.
pub fn decode<T: Entity>(element: &Value, position: usize) -> DbResult<T> {
    T::deserialize(element).map_err(|source| DbError::Deserialization {
        collection: T::COLLECTION.to_string(),
        position,
        source,
    })
}

/// Renders a JSON value the way lookups compare it.
///
/// Strings compare by their content, so `5` and `"5"` are equal. Null and
/// missing values render as the empty string.
pub fn stringify(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
