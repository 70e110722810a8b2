//! Keyed item storage.

use serde::Serialize;
use std::collections::hash_map::{Entry, HashMap};

use super::error::{InventoryError, InventoryResult};
use super::item::InventoryItem;

/// Which branch an upsert took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Map from normalized key to the canonical item value.
///
/// Not synchronized on its own; [`crate::inventory::Inventory`] owns it next to
/// the activity tracker behind a single lock.
#[derive(Debug, Default, Clone)]
pub struct InventoryStore {
    items: HashMap<String, InventoryItem>,
}

impl InventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact-match lookup on an already normalized key.
    pub fn get(&self, key: &str) -> InventoryResult<InventoryItem> {
        self.items
            .get(key)
            .cloned()
            .ok_or_else(|| InventoryError::NotFound(key.to_string()))
    }

    /// Every stored item, in no particular order.
    pub fn list(&self) -> Vec<InventoryItem> {
        self.items.values().cloned().collect()
    }

    /// Inserts the item, or replaces the prior value for its key wholesale.
    pub fn upsert(&mut self, item: InventoryItem) -> UpsertOutcome {
        match self.items.entry(item.key()) {
            Entry::Occupied(mut slot) => {
                slot.insert(item);
                UpsertOutcome::Updated
            }
            Entry::Vacant(slot) => {
                slot.insert(item);
                UpsertOutcome::Created
            }
        }
    }

    pub fn delete(&mut self, key: &str) -> InventoryResult<InventoryItem> {
        self.items
            .remove(key)
            .ok_or_else(|| InventoryError::NotFound(key.to_string()))
    }

    pub fn exists(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    /// Borrowing iteration over `(key, item)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &InventoryItem)> {
        self.items.iter().map(|(key, item)| (key.as_str(), item))
    }
}
