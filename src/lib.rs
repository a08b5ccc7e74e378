//! flatdoc - a minimal embedded document store
//!
//! Records are kept as JSON in a single flat file, grouped into collections
//! named after their type. The store supports append, bounded fetch,
//! collection drop and exact-equality lookups; nothing more.
//!
//! ```ignore
//! use serde::{Deserialize, Serialize};
//! use flatdoc::Store;
//!
//! #[derive(Serialize, Deserialize)]
//! struct Movie { title: String, year: i64 }
//! flatdoc::entity!(Movie);
//!
//! let mut store = Store::open("movies.json")?;
//! store.save(&Movie { title: "x".into(), year: 1 })?;
//!
//! let mut movies: Vec<Movie> = Vec::new();
//! store.fetch_n(&mut movies, 10)?;
//! let first: Movie = store.find_one("year", &1)?;
//! ```
//!
//! The store is single-threaded and uncoordinated: use one `Store` per file.

pub mod codec;
pub mod config;
pub mod document;
pub mod errors;
pub mod storage;
pub mod store;

pub use codec::{Entity, Record};
pub use config::{MatchMode, StoreConfig};
pub use document::{Document, DocumentError};
pub use errors::{DbError, DbResult, Severity};
pub use store::{Predicates, Store};
