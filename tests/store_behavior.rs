//! Store Behavior Tests
//!
//! End-to-end behavior of the public store API:
//! - Save then fetch preserves insertion order and values
//! - Fetch limits clamp to the collection size
//! - Drop removes one collection only and is idempotent
//! - Lookups return the first match or NotFound
//! - Open rejects non-object files and creates missing ones
//! - Floats, options and nested values survive a reopen exactly

use flatdoc::codec::fingerprint;
use flatdoc::{DbError, Predicates, Store};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Item {
    #[serde(rename = "Name")]
    name: String,
}
flatdoc::entity!(Item);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Film {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Year")]
    year: i64,
}
flatdoc::entity!(Film);

// Two distinct types registered under one name share a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LegacyItem {
    #[serde(rename = "Name")]
    name: String,
}
flatdoc::entity!(LegacyItem, "Item");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Position {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Reading {
    value: f64,
    ratio: f64,
    label: Option<String>,
    note: Option<String>,
    at: Position,
    history: Vec<f64>,
}
flatdoc::entity!(Reading);

// =============================================================================
// Helper Functions
// =============================================================================

fn open_fresh() -> (TempDir, Store) {
    let tmp = TempDir::new().unwrap();
    let store = Store::open(tmp.path().join("store.json")).unwrap();
    (tmp, store)
}

fn item(name: &str) -> Item {
    Item {
        name: name.to_string(),
    }
}

fn film(title: &str, year: i64) -> Film {
    Film {
        title: title.to_string(),
        year,
    }
}

fn names(items: &[Item]) -> Vec<&str> {
    items.iter().map(|i| i.name.as_str()).collect()
}

// =============================================================================
// Save / Fetch
// =============================================================================

/// Saved values come back deep-equal, in insertion order.
#[test]
fn test_save_then_fetch_all() {
    let (_tmp, mut store) = open_fresh();
    let saved: Vec<Item> = (0..20).map(|i| item(&format!("item-{}", i))).collect();
    for value in &saved {
        store.save(value).unwrap();
    }

    let mut fetched: Vec<Item> = Vec::new();
    store.fetch_n(&mut fetched, saved.len()).unwrap();
    assert_eq!(fetched, saved);
}

/// FetchN(2) and FetchN(10) over three records.
#[test]
fn test_fetch_limits() {
    let (_tmp, mut store) = open_fresh();
    for name in ["a", "b", "c"] {
        store.save(&item(name)).unwrap();
    }

    let mut two: Vec<Item> = Vec::new();
    store.fetch_n(&mut two, 2).unwrap();
    assert_eq!(names(&two), vec!["a", "b"]);

    let mut all: Vec<Item> = Vec::new();
    store.fetch_n(&mut all, 10).unwrap();
    assert_eq!(names(&all), vec!["a", "b", "c"]);
}

/// Fetch appends to whatever the destination already holds.
#[test]
fn test_fetch_appends_to_destination() {
    let (_tmp, mut store) = open_fresh();
    store.save(&item("stored")).unwrap();

    let mut out = vec![item("existing")];
    store.fetch_n(&mut out, 5).unwrap();
    assert_eq!(names(&out), vec!["existing", "stored"]);
}

/// Data survives a reopen.
#[test]
fn test_reopen_preserves_records() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("store.json");

    {
        let mut store = Store::open(&path).unwrap();
        store.save(&item("a")).unwrap();
        store.save(&film("x", 1)).unwrap();
        store.close().unwrap();
    }

    let store = Store::open(&path).unwrap();
    let mut items: Vec<Item> = Vec::new();
    store.fetch_n(&mut items, 10).unwrap();
    assert_eq!(names(&items), vec!["a"]);
    assert_eq!(store.count::<Film>(), 1);
}

/// Collection membership is purely name based.
#[test]
fn test_same_collection_name_collides() {
    let (_tmp, mut store) = open_fresh();
    store.save(&item("new")).unwrap();
    store
        .save(&LegacyItem {
            name: "old".to_string(),
        })
        .unwrap();

    assert_eq!(store.collections(), vec!["Item".to_string()]);
    let mut items: Vec<Item> = Vec::new();
    store.fetch_n(&mut items, 10).unwrap();
    assert_eq!(names(&items), vec!["new", "old"]);
}

// =============================================================================
// Round Trip
// =============================================================================

/// Awkward floats, absent options and nested structs read back bit-for-bit
/// after the file is closed and reopened.
#[test]
fn test_reopen_round_trips_floats_and_nesting() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("store.json");

    let saved = vec![
        Reading {
            value: 367.00160478027277,
            ratio: 0.1 + 0.2,
            label: Some("kitchen \"north\" sensor".to_string()),
            note: None,
            at: Position {
                lat: 52.520008,
                lon: 13.404954,
            },
            history: vec![1e-300, 2.5e300, -0.000123456789012345, 1.0 / 3.0],
        },
        Reading {
            value: f64::MAX,
            ratio: f64::MIN_POSITIVE,
            label: None,
            note: Some(String::new()),
            at: Position {
                lat: -33.868820,
                lon: 151.209296,
            },
            history: vec![],
        },
    ];

    {
        let mut store = Store::open(&path).unwrap();
        for reading in &saved {
            store.save(reading).unwrap();
        }
        store.close().unwrap();
    }

    let store = Store::open(&path).unwrap();
    let mut fetched: Vec<Reading> = Vec::new();
    store.fetch_n(&mut fetched, 10).unwrap();
    assert_eq!(fetched, saved);
    for (got, want) in fetched.iter().zip(&saved) {
        assert_eq!(got.value.to_bits(), want.value.to_bits());
        assert_eq!(got.ratio.to_bits(), want.ratio.to_bits());
    }

    // the stored hash still describes the reloaded element
    let element = store.document().get("Reading.0.element").unwrap();
    let hash = store.document().get("Reading.0.hash").unwrap();
    assert_eq!(
        hash.as_str().unwrap(),
        fingerprint(&serde_json::to_string(element).unwrap())
    );
}

/// A collection key holding an object is left alone and the save fails.
#[test]
fn test_save_into_object_collection_fails() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("store.json");
    std::fs::write(&path, r#"{"Item":{"k":1}}"#).unwrap();

    let mut store = Store::open(&path).unwrap();
    let err = store.save(&item("a")).unwrap_err();
    assert!(matches!(err, DbError::StorageWrite { .. }));
    assert_eq!(store.count::<Item>(), 0);

    let mut items: Vec<Item> = Vec::new();
    store.fetch_n(&mut items, 10).unwrap();
    assert!(items.is_empty());
    drop(store);

    let on_disk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk, json!({"Item": {"k": 1}}));
}

// =============================================================================
// Drop
// =============================================================================

/// Drop removes only the target collection and tolerates absence.
#[test]
fn test_drop_is_scoped_and_idempotent() {
    let (_tmp, mut store) = open_fresh();
    store.save(&item("a")).unwrap();
    store.save(&film("x", 1)).unwrap();

    store.drop_collection::<Item>().unwrap();
    assert_eq!(store.count::<Item>(), 0);
    assert_eq!(store.count::<Film>(), 1);

    store.drop_collection::<Item>().unwrap();
    assert_eq!(store.collections(), vec!["Film".to_string()]);

    let mut items: Vec<Item> = Vec::new();
    store.fetch_n(&mut items, 10).unwrap();
    assert!(items.is_empty());
}

/// Saving after a drop starts a fresh collection.
#[test]
fn test_save_after_drop() {
    let (_tmp, mut store) = open_fresh();
    store.save(&item("a")).unwrap();
    store.drop_collection::<Item>().unwrap();
    store.save(&item("b")).unwrap();

    let mut items: Vec<Item> = Vec::new();
    store.fetch_n(&mut items, 10).unwrap();
    assert_eq!(names(&items), vec!["b"]);
}

// =============================================================================
// Lookups
// =============================================================================

/// Find stops at the first match even though the output is a sequence.
#[test]
fn test_find_first_match_only() {
    let (_tmp, mut store) = open_fresh();
    store.save(&film("x", 1)).unwrap();
    store.save(&film("y", 1)).unwrap();

    let mut out: Vec<Film> = Vec::new();
    store.find(&mut out, "Year", &1).unwrap();
    assert_eq!(out, vec![film("x", 1)]);
}

/// A unique match is returned; zero matches is NotFound.
#[test]
fn test_find_one_unique_and_missing() {
    let (_tmp, mut store) = open_fresh();
    store.save(&film("x", 1)).unwrap();
    store.save(&film("y", 2)).unwrap();

    let found: Film = store.find_one("Title", "y").unwrap();
    assert_eq!(found, film("y", 2));

    let err = store.find_one::<Film, _>("Title", "w").unwrap_err();
    assert!(matches!(err, DbError::NotFound { .. }));
    assert_eq!(err.code(), "FLATDOC_NOT_FOUND");
}

/// FindWhere collects every match across the collection.
#[test]
fn test_find_where_scans_whole_collection() {
    let (_tmp, mut store) = open_fresh();
    store.save(&film("x", 1)).unwrap();
    store.save(&film("y", 2)).unwrap();
    store.save(&film("z", 1)).unwrap();

    let predicates: Predicates = [("Year".to_string(), json!(1))].into_iter().collect();
    let mut out: Vec<Film> = Vec::new();
    store.find_where(&mut out, &predicates).unwrap();
    assert_eq!(out, vec![film("x", 1), film("z", 1)]);

    let first: Film = store.find_one_where(&predicates).unwrap();
    assert_eq!(first, film("x", 1));
}

// =============================================================================
// Open
// =============================================================================

/// A root that is not an object cannot be opened.
#[test]
fn test_open_invalid_database_file() {
    let tmp = TempDir::new().unwrap();
    for (name, content) in [
        ("string.json", r#""not-an-object""#),
        ("array.json", "[]"),
        ("broken.json", "{\"a\":"),
    ] {
        let path = tmp.path().join(name);
        std::fs::write(&path, content).unwrap();
        let err = Store::open(&path).unwrap_err();
        assert!(
            matches!(err, DbError::InvalidDatabaseFile { .. }),
            "{}: {}",
            name,
            err
        );
        assert!(err.is_fatal());
    }
}

/// A missing path is created and yields an empty document.
#[test]
fn test_open_nonexistent_creates_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("new.json");
    assert!(!path.exists());

    let store = Store::open(&path).unwrap();
    assert!(path.exists());
    assert!(store.collections().is_empty());
    assert_eq!(store.path(), path.as_path());
}
