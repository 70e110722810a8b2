//! Per-key update counters backing the "most active" query.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::error::{InventoryError, InventoryResult};

/// Update count for one item key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub item_key: String,
    pub update_count: u64,
}

/// Counts how many times each key has been written.
#[derive(Debug, Default, Clone)]
pub struct ActivityTracker {
    counters: HashMap<String, u64>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a counter at 1 for a freshly created key.
    pub fn record_create(&mut self, key: &str) {
        self.counters.insert(key.to_string(), 1);
    }

    /// Bumps the counter for an existing key and returns the new count.
    pub fn record_update(&mut self, key: &str) -> InventoryResult<u64> {
        let count = self
            .counters
            .get_mut(key)
            .ok_or_else(|| InventoryError::InternalConsistency(key.to_string()))?;
        *count += 1;
        Ok(*count)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.counters.remove(key).is_some()
    }

    pub fn count(&self, key: &str) -> Option<u64> {
        self.counters.get(key).copied()
    }

    pub fn exists(&self, key: &str) -> bool {
        self.counters.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.counters.keys().map(String::as_str)
    }

    /// Keys whose counter equals the current maximum. Empty when nothing is tracked.
    pub fn most_active_keys(&self) -> HashSet<String> {
        let Some(highest) = self.counters.values().copied().max() else {
            return HashSet::new();
        };

        self.counters
            .iter()
            .filter(|(_, count)| **count == highest)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// All records, sorted by key.
    pub fn records(&self) -> Vec<ActivityRecord> {
        let mut records: Vec<ActivityRecord> = self
            .counters
            .iter()
            .map(|(key, count)| ActivityRecord {
                item_key: key.clone(),
                update_count: *count,
            })
            .collect();
        records.sort_by(|a, b| a.item_key.cmp(&b.item_key));
        records
    }
}
