use std::collections::HashMap;
use std::collections::hash_map;

use serde::{Deserialize, Serialize};

use super::OperationKey;

/// Results of one execute/retry pass, keyed by operation key.
///
/// Failed operations are simply absent. First write per key wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultStore {
    entries: HashMap<OperationKey, serde_json::Value>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the key is already present. Returns whether it was stored.
    pub fn insert(&mut self, key: OperationKey, value: serde_json::Value) -> bool {
        match self.entries.entry(key) {
            hash_map::Entry::Occupied(_) => false,
            hash_map::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &OperationKey> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OperationKey, &serde_json::Value)> {
        self.entries.iter()
    }

    /// Merge another pass into this one (e.g. a retry pass into the first
    /// execute). Entries already present here are kept.
    pub fn merge(&mut self, other: ResultStore) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    pub fn into_inner(self) -> HashMap<OperationKey, serde_json::Value> {
        self.entries
    }
}

impl IntoIterator for ResultStore {
    type Item = (OperationKey, serde_json::Value);
    type IntoIter = hash_map::IntoIter<OperationKey, serde_json::Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
