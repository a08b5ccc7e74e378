//! Predicate lookups
//!
//! Lookups scan a collection in insertion order and compare fields by their
//! string rendering (see [`codec::stringify`]): `5` and `"5"` are equal.
//! Field names are dotted paths into the stored element.
//!
//! - `find` / `find_one` stop at the first match, so `find` yields at most
//!   one element.
//! - `find_where` scans the whole collection; `find_one_where` stops at the
//!   first match.
//! - A predicate map is combined according to [`MatchMode`].

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{element_of, Store};
use crate::codec::{self, stringify, validate_collection_name, Entity};
use crate::config::MatchMode;
use crate::document::{lookup, path::split_path};
use crate::errors::{DbError, DbResult};

/// Field name to expected value, used by the `*_where` lookups.
pub type Predicates = HashMap<String, Value>;

impl Store {
    /// Appends the first element of `T`'s collection whose `field` equals
    /// `value` to `out`.
    ///
    /// # Errors
    ///
    /// `NotFound` if no element matches, `InvalidArgument` for an empty or
    /// malformed field name.
    pub fn find<T, V>(&self, out: &mut Vec<T>, field: &str, value: &V) -> DbResult<()>
    where
        T: Entity,
        V: Serialize + ?Sized,
    {
        out.push(self.find_one(field, value)?);
        Ok(())
    }

    /// Returns the first element of `T`'s collection whose `field` equals
    /// `value`.
    pub fn find_one<T, V>(&self, field: &str, value: &V) -> DbResult<T>
    where
        T: Entity,
        V: Serialize + ?Sized,
    {
        validate_collection_name(T::COLLECTION)?;
        check_field(field)?;
        let expected = expected_text::<T, V>(value)?;

        let found = self
            .collection(T::COLLECTION)
            .iter()
            .map(element_of)
            .enumerate()
            .find(|(_, element)| field_matches(element, field, &expected));

        debug!(
            event = "FIND_COMPLETE",
            collection = T::COLLECTION,
            field,
            matched = found.is_some(),
        );

        match found {
            Some((position, element)) => codec::decode(element, position),
            None => Err(not_found::<T>()),
        }
    }

    /// Appends every element of `T`'s collection that satisfies
    /// `predicates` to `out`.
    ///
    /// # Errors
    ///
    /// `NotFound` if nothing matches. `Deserialization` aborts the scan and
    /// leaves the elements decoded so far in `out`.
    pub fn find_where<T: Entity>(&self, out: &mut Vec<T>, predicates: &Predicates) -> DbResult<()> {
        validate_collection_name(T::COLLECTION)?;
        check_predicates(predicates)?;
        let predicates = expected_entries(predicates);
        let mode = self.config.match_mode;

        let mut matched = 0;
        for (position, element) in self.collection(T::COLLECTION).iter().map(element_of).enumerate() {
            if matches_all(element, &predicates, mode) {
                out.push(codec::decode(element, position)?);
                matched += 1;
            }
        }

        debug!(
            event = "FIND_COMPLETE",
            collection = T::COLLECTION,
            predicates = predicates.len(),
            matched,
        );

        if matched == 0 {
            return Err(not_found::<T>());
        }
        Ok(())
    }

    /// Returns the first element of `T`'s collection that satisfies
    /// `predicates`.
    pub fn find_one_where<T: Entity>(&self, predicates: &Predicates) -> DbResult<T> {
        validate_collection_name(T::COLLECTION)?;
        check_predicates(predicates)?;
        let predicates = expected_entries(predicates);
        let mode = self.config.match_mode;

        self.collection(T::COLLECTION)
            .iter()
            .map(element_of)
            .enumerate()
            .find(|(_, element)| matches_all(element, &predicates, mode))
            .map_or_else(
                || Err(not_found::<T>()),
                |(position, element)| codec::decode(element, position),
            )
    }
}

/// Whether `element.<field>` renders the same as `expected`.
pub(crate) fn field_matches(element: &Value, field: &str, expected: &str) -> bool {
    stringify(lookup(element, field)) == expected
}

/// Applies a rendered predicate list to one element.
///
/// With [`MatchMode::LastEntry`] only the final entry decides; earlier
/// results are overwritten. An empty list matches nothing in either mode.
pub(crate) fn matches_all(element: &Value, predicates: &[(&str, String)], mode: MatchMode) -> bool {
    match mode {
        MatchMode::LastEntry => {
            let mut matched = false;
            for (field, expected) in predicates {
                matched = field_matches(element, field, expected);
            }
            matched
        }
        MatchMode::AllEntries => {
            !predicates.is_empty()
                && predicates
                    .iter()
                    .all(|(field, expected)| field_matches(element, field, expected))
        }
    }
}

fn expected_entries(predicates: &Predicates) -> Vec<(&str, String)> {
    predicates
        .iter()
        .map(|(field, value)| (field.as_str(), stringify(Some(value))))
        .collect()
}

fn expected_text<T: Entity, V: Serialize + ?Sized>(value: &V) -> DbResult<String> {
    let value = serde_json::to_value(value).map_err(|source| DbError::Serialization {
        collection: T::COLLECTION.to_string(),
        source,
    })?;
    Ok(stringify(Some(&value)))
}

fn check_field(field: &str) -> DbResult<()> {
    split_path(field)
        .map(|_| ())
        .map_err(|e| DbError::invalid_argument(format!("invalid field name: {}", e)))
}

fn check_predicates(predicates: &Predicates) -> DbResult<()> {
    predicates.keys().try_for_each(|field| check_field(field))
}

fn not_found<T: Entity>() -> DbError {
    DbError::NotFound {
        collection: T::COLLECTION.to_string(),
    }
}
