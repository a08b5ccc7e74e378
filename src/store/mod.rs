//! The document store
//!
//! A [`Store`] owns the in-memory [`Document`] mirrored from one JSON file.
//! Each top-level key of the document is a collection named after an
//! [`Entity`] type; its value is the ordered array of [`Record`]s saved for
//! that type.
//!
//! # Invariants
//!
//! - Collections are append-only. Records are never updated in place; the
//!   only removal is dropping a whole collection.
//! - Every successful mutation is followed by a full rewrite of the file.
//! - A failed rewrite leaves the in-memory document mutated and the store
//!   dirty. [`Store::flush`], [`Store::close`] and `Drop` retry the write.
//!
//! The store performs no locking. One store per file, one thread at a time.

mod query;

pub use query::Predicates;

use std::path::Path;

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::codec::{self, validate_collection_name, Entity, Record};
use crate::config::StoreConfig;
use crate::document::Document;
use crate::errors::{DbError, DbResult};
use crate::storage::FileStorage;

static MISSING: Value = Value::Null;

/// An embedded JSON document store backed by a single file.
#[derive(Debug)]
pub struct Store {
    storage: FileStorage,
    document: Document,
    config: StoreConfig,
    dirty: bool,
}

impl Store {
    /// Opens the store at `path` with the default configuration.
    ///
    /// The file is created empty if it does not exist and is never
    /// truncated. An empty file yields an empty document.
    ///
    /// # Errors
    ///
    /// `InvalidDatabaseFile` if the file is non-empty and not a JSON object,
    /// `StorageRead` if it cannot be created or read.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Self::open_with(path, StoreConfig::default())
    }

    /// Opens the store at `path` with an explicit configuration.
    pub fn open_with(path: impl AsRef<Path>, config: StoreConfig) -> DbResult<Self> {
        let path = path.as_ref();
        let storage = FileStorage::new(path, &config);
        let content = storage.load()?;

        let document =
            Document::parse(&content).map_err(|e| DbError::InvalidDatabaseFile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        info!(
            event = "STORE_OPENED",
            path = %path.display(),
            collections = document.root().len(),
            bytes = content.len(),
        );

        Ok(Self {
            storage,
            document,
            config,
            dirty: false,
        })
    }

    /// Appends `value` to its type's collection and persists the document.
    ///
    /// The record is stamped with the current time and a fingerprint of the
    /// serialized value. The collection is created on first save.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `value` does not serialize to a JSON object,
    /// `Serialization` if it cannot be serialized, `StorageWrite` if the
    /// document cannot be updated or written. After `StorageWrite` the record
    /// may exist in memory but not on disk.
    pub fn save<T: Entity>(&mut self, value: &T) -> DbResult<()> {
        let record = codec::encode(value, Utc::now().timestamp())?;
        let hash = record.hash.clone();
        let record = serde_json::to_value(&record).map_err(|source| DbError::Serialization {
            collection: T::COLLECTION.to_string(),
            source,
        })?;

        self.document.append(T::COLLECTION, record).map_err(|e| {
            DbError::mutation_failed(format!(
                "failed to append to collection {}: {}",
                T::COLLECTION,
                e
            ))
        })?;
        self.dirty = true;
        self.persist()?;

        debug!(
            event = "RECORD_SAVED",
            collection = T::COLLECTION,
            hash = %hash,
            count = self.document.array_len(T::COLLECTION),
        );
        Ok(())
    }

    /// Appends up to `limit` elements of `T`'s collection to `out`, in
    /// insertion order.
    ///
    /// A limit above the collection size returns the whole collection. A
    /// missing collection returns nothing.
    ///
    /// # Errors
    ///
    /// `Deserialization` aborts the fetch; `out` keeps the elements decoded
    /// before the failure.
    pub fn fetch_n<T: Entity>(&self, out: &mut Vec<T>, limit: usize) -> DbResult<()> {
        validate_collection_name(T::COLLECTION)?;

        let records = self.collection(T::COLLECTION);
        let start = out.len();
        for (position, record) in records.iter().take(limit).enumerate() {
            out.push(codec::decode(element_of(record), position)?);
        }

        debug!(
            event = "FETCH_COMPLETE",
            collection = T::COLLECTION,
            limit,
            returned = out.len() - start,
        );
        Ok(())
    }

    /// Older name of [`Store::fetch_n`].
    #[deprecated(note = "use `fetch_n`")]
    pub fn fetch_list<T: Entity>(&self, out: &mut Vec<T>, limit: usize) -> DbResult<()> {
        self.fetch_n(out, limit)
    }

    /// Removes `T`'s whole collection and persists the document.
    ///
    /// Dropping a collection that does not exist succeeds. Other collections
    /// are untouched.
    pub fn drop_collection<T: Entity>(&mut self) -> DbResult<()> {
        validate_collection_name(T::COLLECTION)?;

        let removed = self.document.delete(T::COLLECTION).map_err(|e| {
            DbError::mutation_failed(format!(
                "failed to drop collection {}: {}",
                T::COLLECTION,
                e
            ))
        })?;
        self.dirty = true;
        self.persist()?;

        let existed = removed.is_some();
        let removed_records = removed
            .as_ref()
            .and_then(serde_json::Value::as_array)
            .map_or(0, Vec::len);
        debug!(
            event = "COLLECTION_DROPPED",
            collection = T::COLLECTION,
            existed,
            removed = removed_records,
        );
        Ok(())
    }

    /// Number of records in `T`'s collection.
    pub fn count<T: Entity>(&self) -> usize {
        self.collection(T::COLLECTION).len()
    }

    /// Names of the collections currently in the document.
    pub fn collections(&self) -> Vec<String> {
        self.document.keys().map(str::to_string).collect()
    }

    /// The full stored records of `T`'s collection, in insertion order.
    pub fn records<T: Entity>(&self) -> DbResult<Vec<Record<T>>> {
        validate_collection_name(T::COLLECTION)?;

        self.collection(T::COLLECTION)
            .iter()
            .enumerate()
            .map(|(position, record)| {
                Record::<T>::deserialize(record).map_err(|source| DbError::Deserialization {
                    collection: T::COLLECTION.to_string(),
                    position,
                    source,
                })
            })
            .collect()
    }

    /// Retries the file write if an earlier one failed.
    pub fn flush(&mut self) -> DbResult<()> {
        if self.dirty {
            self.persist()?;
        }
        Ok(())
    }

    /// Flushes and releases the store.
    pub fn close(mut self) -> DbResult<()> {
        self.flush()
    }

    /// Whether the in-memory document has changes the file lacks.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn path(&self) -> &Path {
        self.storage.path()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Records of a collection; empty when missing or not an array.
    fn collection(&self, name: &str) -> &[Value] {
        self.document
            .root()
            .get(name)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn persist(&mut self) -> DbResult<()> {
        let text = self
            .document
            .to_text(self.config.pretty)
            .map_err(|e| DbError::mutation_failed(format!("failed to render document: {}", e)))?;
        self.storage.write(&text)?;
        self.dirty = false;
        Ok(())
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        if !self.dirty {
            return;
        }
        if let Err(e) = self.persist() {
            warn!(
                event = "STORE_FLUSH_FAILED",
                path = %self.storage.path().display(),
                error = %e,
            );
        }
    }
}

fn element_of(record: &Value) -> &Value {
    record.get("element").unwrap_or(&MISSING)
}
