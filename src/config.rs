//! Store configuration
//!
//! Plain data with defaults; there is no environment or file lookup of its
//! own. The struct derives serde so a host application can embed it in its
//! own configuration file.

use serde::{Deserialize, Serialize};

/// How the `*_where` lookups combine the entries of a predicate map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// A record matches when the last entry visited matches. Entries are
    /// visited in map iteration order, so with several entries the outcome
    /// depends on that order. This is the historical behavior.
    #[default]
    LastEntry,
    /// A record matches when every entry matches.
    AllEntries,
}

/// Configuration for a [`Store`](crate::Store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Write to a temporary file and rename it over the database file.
    pub atomic_writes: bool,
    /// fsync the written file before it becomes visible.
    pub sync_writes: bool,
    /// Pretty-print the database file.
    pub pretty: bool,
    /// Predicate combination used by `find_where` / `find_one_where`.
    pub match_mode: MatchMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            atomic_writes: true,
            sync_writes: false,
            pretty: false,
            match_mode: MatchMode::LastEntry,
        }
    }
}

impl StoreConfig {
    /// Overwrite the database file in place instead of rename-over.
    pub fn direct_writes(mut self) -> Self {
        self.atomic_writes = false;
        self
    }

    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }
}
