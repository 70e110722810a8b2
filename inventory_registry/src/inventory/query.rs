//! Stateless query engine over a consistent view of the store and tracker.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::activity::ActivityTracker;
use super::error::{InventoryError, InventoryResult};
use super::item::{require_key, InventoryItem};
use super::store::InventoryStore;

/// Query modes accepted by the listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum QueryMode {
    #[default]
    All,
    HighestQuantity,
    LowestQuantity,
    OldestItem,
    NewestItem,
    ByName,
    MostActive,
}

impl QueryMode {
    /// Wire name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "none",
            Self::HighestQuantity => "highestQuantity",
            Self::LowestQuantity => "lowestQuantity",
            Self::OldestItem => "oldestItem",
            Self::NewestItem => "newestItem",
            Self::ByName => "byName",
            Self::MostActive => "mostActivity",
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryMode {
    type Err = InventoryError;

    /// Accepts wire names case-insensitively, or their numeric discriminants.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mode = match raw.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "0" => Self::All,
            "highestquantity" | "1" => Self::HighestQuantity,
            "lowestquantity" | "2" => Self::LowestQuantity,
            "oldestitem" | "3" => Self::OldestItem,
            "newestitem" | "4" => Self::NewestItem,
            "byname" | "5" => Self::ByName,
            "mostactivity" | "6" => Self::MostActive,
            _ => {
                return Err(InventoryError::InvalidInput(format!(
                    "unknown query option: {raw}"
                )))
            }
        };
        Ok(mode)
    }
}

/// Read-only view of both ledgers taken under one read lock.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub store: &'a InventoryStore,
    pub activity: &'a ActivityTracker,
}

#[derive(Debug, Clone, Copy)]
enum Extreme {
    Max,
    Min,
}

/// Runs a query. `name` is only consulted by [`QueryMode::ByName`].
///
/// Results are sorted by key for stable output.
pub fn execute(
    mode: QueryMode,
    name: Option<&str>,
    snapshot: Snapshot<'_>,
) -> InventoryResult<Vec<InventoryItem>> {
    let mut items = match mode {
        QueryMode::All => snapshot.store.list(),
        QueryMode::ByName => {
            let name = name
                .ok_or_else(|| InventoryError::InvalidInput("byName requires a name".to_string()))?;
            vec![snapshot.store.get(&require_key(name)?)?]
        }
        QueryMode::HighestQuantity => select_extreme(snapshot.store, |item| item.quantity, Extreme::Max),
        QueryMode::LowestQuantity => select_extreme(snapshot.store, |item| item.quantity, Extreme::Min),
        QueryMode::NewestItem => select_extreme(snapshot.store, |item| item.created_on, Extreme::Max),
        QueryMode::OldestItem => select_extreme(snapshot.store, |item| item.created_on, Extreme::Min),
        QueryMode::MostActive => most_active(snapshot)?,
    };

    items.sort_by_key(InventoryItem::key);
    Ok(items)
}

/// Every item tying for the extreme value of `field`.
fn select_extreme<T, F>(store: &InventoryStore, field: F, extreme: Extreme) -> Vec<InventoryItem>
where
    T: Ord + Copy,
    F: Fn(&InventoryItem) -> T,
{
    let values = store.iter().map(|(_, item)| field(item));
    let target = match extreme {
        Extreme::Max => values.max(),
        Extreme::Min => values.min(),
    };

    let Some(target) = target else {
        return Vec::new();
    };

    store
        .iter()
        .filter(|(_, item)| field(item) == target)
        .map(|(_, item)| item.clone())
        .collect()
}

fn most_active(snapshot: Snapshot<'_>) -> InventoryResult<Vec<InventoryItem>> {
    snapshot
        .activity
        .most_active_keys()
        .into_iter()
        .map(|key| match snapshot.store.get(&key) {
            Ok(item) => Ok(item),
            Err(_) => Err(InventoryError::InternalConsistency(key)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::item::midnight;

    fn ledgers(items: &[(&str, i32, (i32, u32, u32))]) -> (InventoryStore, ActivityTracker) {
        let mut store = InventoryStore::new();
        let mut activity = ActivityTracker::new();
        for (name, quantity, (y, m, d)) in items {
            let item = InventoryItem::new(*name, *quantity, midnight(*y, *m, *d));
            activity.record_create(&item.key());
            store.upsert(item);
        }
        (store, activity)
    }

    fn names(items: &[InventoryItem]) -> Vec<&str> {
        items.iter().map(|item| item.name.as_str()).collect()
    }

    #[test]
    fn test_parse_query_modes() {
        assert_eq!("".parse::<QueryMode>(), Ok(QueryMode::All));
        assert_eq!("none".parse::<QueryMode>(), Ok(QueryMode::All));
        assert_eq!("highestQuantity".parse::<QueryMode>(), Ok(QueryMode::HighestQuantity));
        assert_eq!("LOWESTQUANTITY".parse::<QueryMode>(), Ok(QueryMode::LowestQuantity));
        assert_eq!("3".parse::<QueryMode>(), Ok(QueryMode::OldestItem));
        assert_eq!("newestItem".parse::<QueryMode>(), Ok(QueryMode::NewestItem));
        assert_eq!("byName".parse::<QueryMode>(), Ok(QueryMode::ByName));
        assert_eq!("mostActivity".parse::<QueryMode>(), Ok(QueryMode::MostActive));
        assert!(matches!(
            "cheapest".parse::<QueryMode>(),
            Err(InventoryError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_mode_wire_names_round_trip() {
        for mode in [
            QueryMode::All,
            QueryMode::HighestQuantity,
            QueryMode::LowestQuantity,
            QueryMode::OldestItem,
            QueryMode::NewestItem,
            QueryMode::ByName,
            QueryMode::MostActive,
        ] {
            assert_eq!(mode.to_string().parse::<QueryMode>(), Ok(mode));
        }
    }

    #[test]
    fn test_extremal_queries_on_empty_store_are_empty() {
        let (store, activity) = ledgers(&[]);
        let snapshot = Snapshot { store: &store, activity: &activity };

        for mode in [
            QueryMode::All,
            QueryMode::HighestQuantity,
            QueryMode::LowestQuantity,
            QueryMode::OldestItem,
            QueryMode::NewestItem,
            QueryMode::MostActive,
        ] {
            assert_eq!(execute(mode, None, snapshot), Ok(Vec::new()), "mode {mode}");
        }
    }

    #[test]
    fn test_quantity_extremes_return_ties() {
        let (store, activity) = ledgers(&[
            ("Apples", 3, (2020, 1, 1)),
            ("Oranges", 55, (2020, 2, 1)),
            ("Pomegranates", 55, (2020, 2, 10)),
            ("Limes", 3, (2020, 3, 1)),
            ("Pears", 10, (2020, 3, 2)),
        ]);
        let snapshot = Snapshot { store: &store, activity: &activity };

        let highest = execute(QueryMode::HighestQuantity, None, snapshot).unwrap();
        assert_eq!(names(&highest), vec!["Oranges", "Pomegranates"]);

        let lowest = execute(QueryMode::LowestQuantity, None, snapshot).unwrap();
        assert_eq!(names(&lowest), vec!["Apples", "Limes"]);
    }

    #[test]
    fn test_date_extremes() {
        let (store, activity) = ledgers(&[
            ("Apples", 3, (2020, 1, 1)),
            ("Oranges", 7, (2020, 2, 1)),
            ("Pomegranates", 55, (2020, 2, 10)),
            ("Figs", 1, (2020, 2, 10)),
        ]);
        let snapshot = Snapshot { store: &store, activity: &activity };

        let oldest = execute(QueryMode::OldestItem, None, snapshot).unwrap();
        assert_eq!(names(&oldest), vec!["Apples"]);

        let newest = execute(QueryMode::NewestItem, None, snapshot).unwrap();
        assert_eq!(names(&newest), vec!["Figs", "Pomegranates"]);
    }

    #[test]
    fn test_by_name_outcomes() {
        let (store, activity) = ledgers(&[("Apples", 3, (2020, 1, 1))]);
        let snapshot = Snapshot { store: &store, activity: &activity };

        let found = execute(QueryMode::ByName, Some("APPLES"), snapshot).unwrap();
        assert_eq!(names(&found), vec!["Apples"]);

        assert!(matches!(
            execute(QueryMode::ByName, Some("dummy"), snapshot),
            Err(InventoryError::NotFound(_))
        ));
        assert!(matches!(
            execute(QueryMode::ByName, Some("  "), snapshot),
            Err(InventoryError::InvalidInput(_))
        ));
        assert!(matches!(
            execute(QueryMode::ByName, None, snapshot),
            Err(InventoryError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_most_active_follows_counters() {
        let (store, mut activity) = ledgers(&[
            ("Apples", 3, (2020, 1, 1)),
            ("Oranges", 7, (2020, 2, 1)),
        ]);

        let all = execute(QueryMode::MostActive, None, Snapshot { store: &store, activity: &activity }).unwrap();
        assert_eq!(names(&all), vec!["Apples", "Oranges"]);

        activity.record_update("oranges").unwrap();
        let winners =
            execute(QueryMode::MostActive, None, Snapshot { store: &store, activity: &activity }).unwrap();
        assert_eq!(names(&winners), vec!["Oranges"]);
    }

    #[test]
    fn test_most_active_detects_orphaned_counter() {
        let (store, mut activity) = ledgers(&[("Apples", 3, (2020, 1, 1))]);
        activity.record_create("ghost");
        activity.record_update("ghost").unwrap();

        assert_eq!(
            execute(QueryMode::MostActive, None, Snapshot { store: &store, activity: &activity }),
            Err(InventoryError::InternalConsistency("ghost".to_string()))
        );
    }
}
