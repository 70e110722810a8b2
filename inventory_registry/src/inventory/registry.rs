//! Process-wide inventory: item store and activity tracker behind one lock.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, error, instrument};

use super::activity::{ActivityRecord, ActivityTracker};
use super::error::{InventoryError, InventoryResult};
use super::item::{midnight, require_key, InventoryItem};
use super::query::{self, QueryMode, Snapshot};
use super::store::{InventoryStore, UpsertOutcome};

/// Outcome counts of a batch upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub created: usize,
    pub updated: usize,
}

/// Items and activity read under the same lock.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryExport {
    pub items: Vec<InventoryItem>,
    pub activity: Vec<ActivityRecord>,
}

/// Both ledgers. Every compound mutation goes through here so the key sets
/// stay identical.
#[derive(Debug, Default)]
struct Ledger {
    store: InventoryStore,
    activity: ActivityTracker,
}

impl Ledger {
    fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            store: &self.store,
            activity: &self.activity,
        }
    }

    /// Fails before any mutation if the two ledgers disagree on `key`.
    fn ensure_consistent(&self, key: &str) -> InventoryResult<()> {
        if self.store.exists(key) == self.activity.exists(key) {
            return Ok(());
        }
        error!(
            key,
            in_store = self.store.exists(key),
            in_activity = self.activity.exists(key),
            "Inventory and activity ledgers diverged"
        );
        Err(InventoryError::InternalConsistency(key.to_string()))
    }

    fn upsert(&mut self, item: InventoryItem) -> InventoryResult<UpsertOutcome> {
        let key = item.key();
        self.ensure_consistent(&key)?;

        let outcome = self.store.upsert(item);
        match outcome {
            UpsertOutcome::Created => self.activity.record_create(&key),
            UpsertOutcome::Updated => {
                self.activity.record_update(&key)?;
            }
        }
        debug!(key = %key, ?outcome, "Upserted inventory item");
        Ok(outcome)
    }

    fn delete(&mut self, key: &str) -> InventoryResult<InventoryItem> {
        self.ensure_consistent(key)?;

        let removed = self.store.delete(key)?;
        self.activity.remove(key);
        debug!(key, "Deleted inventory item");
        Ok(removed)
    }

    fn keys_match(&self) -> bool {
        self.store.len() == self.activity.len()
            && self.store.keys().all(|key| self.activity.exists(key))
    }
}

/// The inventory registry.
///
/// Built once at startup and shared behind an `Arc`. Writers hold the write
/// lock for the whole store-plus-activity update, so concurrent upserts to the
/// same key never lose an increment and readers never see one ledger ahead of
/// the other.
#[derive(Debug, Default)]
pub struct Inventory {
    ledger: RwLock<Ledger>,
}

impl Inventory {
    /// Empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inventory holding `items`, applied in order as upserts.
    pub fn with_items(items: impl IntoIterator<Item = InventoryItem>) -> InventoryResult<Self> {
        let inventory = Self::new();
        {
            let mut ledger = inventory.ledger.write();
            for item in items {
                require_key(&item.name)?;
                ledger.upsert(item)?;
            }
        }
        Ok(inventory)
    }

    /// Inventory pre-loaded with the default example records, each at activity 1.
    pub fn seeded() -> Self {
        let inventory = Self::new();
        {
            let mut ledger = inventory.ledger.write();
            for item in seed_items() {
                let key = item.key();
                ledger.store.upsert(item);
                ledger.activity.record_create(&key);
            }
        }
        inventory
    }

    /// Looks up an item by name, case-insensitively.
    pub fn get(&self, name: &str) -> InventoryResult<InventoryItem> {
        let key = require_key(name)?;
        self.ledger.read().store.get(&key)
    }

    pub fn list(&self) -> Vec<InventoryItem> {
        self.ledger.read().store.list()
    }

    /// Whether an item exists for `name`. Blank names never exist.
    pub fn exists(&self, name: &str) -> bool {
        require_key(name)
            .map(|key| self.ledger.read().store.exists(&key))
            .unwrap_or(false)
    }

    /// Whether the activity tracker holds a record for `name`.
    pub fn is_tracked(&self, name: &str) -> bool {
        require_key(name)
            .map(|key| self.ledger.read().activity.exists(&key))
            .unwrap_or(false)
    }

    pub fn activity_count(&self, name: &str) -> Option<u64> {
        let key = require_key(name).ok()?;
        self.ledger.read().activity.count(&key)
    }

    pub fn most_active_keys(&self) -> HashSet<String> {
        self.ledger.read().activity.most_active_keys()
    }

    pub fn len(&self) -> usize {
        self.ledger.read().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ledger.read().store.is_empty()
    }

    /// Insert-or-replace. New keys start at activity 1, existing keys gain 1.
    #[instrument(skip(self, item), fields(name = %item.name))]
    pub fn upsert(&self, item: InventoryItem) -> InventoryResult<UpsertOutcome> {
        require_key(&item.name)?;
        self.ledger.write().upsert(item)
    }

    /// Insert only; an existing key is [`InventoryError::AlreadyExists`].
    #[instrument(skip(self, item), fields(name = %item.name))]
    pub fn create(&self, item: InventoryItem) -> InventoryResult<()> {
        let key = require_key(&item.name)?;
        let mut ledger = self.ledger.write();
        if ledger.store.exists(&key) {
            return Err(InventoryError::AlreadyExists(key));
        }
        ledger.upsert(item).map(|_| ())
    }

    /// Upserts every item under a single write lock.
    ///
    /// Names are checked up front so an invalid item leaves the inventory untouched.
    #[instrument(skip(self, items), fields(count = items.len()))]
    pub fn upsert_many(&self, items: Vec<InventoryItem>) -> InventoryResult<BatchSummary> {
        if items.is_empty() {
            return Err(InventoryError::InvalidInput("batch must contain at least one item".to_string()));
        }
        for item in &items {
            require_key(&item.name)?;
        }

        let mut ledger = self.ledger.write();
        let mut summary = BatchSummary::default();
        for item in items {
            match ledger.upsert(item)? {
                UpsertOutcome::Created => summary.created += 1,
                UpsertOutcome::Updated => summary.updated += 1,
            }
        }
        Ok(summary)
    }

    /// Removes the item and its activity record together.
    #[instrument(skip(self))]
    pub fn delete(&self, name: &str) -> InventoryResult<InventoryItem> {
        let key = require_key(name)?;
        self.ledger.write().delete(&key)
    }

    /// Runs a query against a consistent view of both ledgers.
    pub fn query(&self, mode: QueryMode, name: Option<&str>) -> InventoryResult<Vec<InventoryItem>> {
        let ledger = self.ledger.read();
        query::execute(mode, name, ledger.snapshot())
    }

    /// Items sorted by key, with their activity records.
    pub fn export(&self) -> InventoryExport {
        let ledger = self.ledger.read();
        let mut items = ledger.store.list();
        items.sort_by_key(InventoryItem::key);
        InventoryExport {
            items,
            activity: ledger.activity.records(),
        }
    }

    /// True when the store and tracker hold exactly the same keys.
    pub fn is_consistent(&self) -> bool {
        self.ledger.read().keys_match()
    }
}

/// Records every fresh inventory starts with.
pub fn seed_items() -> Vec<InventoryItem> {
    vec![
        InventoryItem::new("Apples", 3, midnight(2020, 1, 1)),
        InventoryItem::new("Oranges", 7, midnight(2020, 2, 1)),
        InventoryItem::new("Pomegranates", 55, midnight(2020, 2, 10)),
    ]
}
