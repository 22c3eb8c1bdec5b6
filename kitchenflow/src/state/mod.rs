//! The shared keyed state ("blackboard") visible to every stage of one run.
//!
//! Writes are last-write-wins and atomic per key; there is no multi-key
//! transaction because each work unit owns exactly one declared output key.
//! Readers observe the value as of the moment they read. Ordering between
//! producers and consumers comes from composition (Sequential vs Parallel),
//! never from the store itself.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// A thread-safe key/value blackboard scoped to one pipeline run.
#[derive(Debug, Default)]
pub struct SharedState {
    data: RwLock<HashMap<String, serde_json::Value>>,
    revision: AtomicU64,
}

impl SharedState {
    /// Creates a new empty state store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a state store seeded with existing data.
    #[must_use]
    pub fn from_data(data: HashMap<String, serde_json::Value>) -> Self {
        Self {
            data: RwLock::new(data),
            revision: AtomicU64::new(0),
        }
    }

    /// Gets a value. Returns `None` for keys no producer has written yet.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.data.read().get(key).cloned()
    }

    /// Checks if a key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// Sets a value, replacing any prior value for the key.
    ///
    /// The write is atomic; concurrent writers to the same key serialize on
    /// the lock and the last one wins.
    pub fn set(&self, key: impl Into<String>, value: serde_json::Value) {
        self.data.write().insert(key.into(), value);
        self.revision.fetch_add(1, Ordering::SeqCst);
    }

    /// Returns the mutation count since creation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    /// Takes an immutable copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        let data = self.data.read().clone();
        StateSnapshot {
            revision: self.revision.load(Ordering::SeqCst),
            data,
        }
    }

    /// Returns a copy of all data.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        self.data.read().clone()
    }

    /// Returns all keys.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns true if no key has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

/// An immutable copy of the blackboard taken at a point in time.
#[derive(Debug, Clone, Default)]
pub struct StateSnapshot {
    /// The store revision at capture time.
    pub revision: u64,
    data: HashMap<String, serde_json::Value>,
}

impl StateSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a value from the snapshot.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Checks if a key exists in the snapshot.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns the snapshot contents.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        self.data.clone()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
