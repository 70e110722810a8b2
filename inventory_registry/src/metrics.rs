//! In-process operation counters served by the `/metrics` endpoint.

use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::inventory::{InventoryError, InventoryResult};

/// Counters keyed by operation name and by error kind.
#[derive(Debug, Default)]
pub struct InventoryMetrics {
    operations: DashMap<&'static str, u64>,
    errors: DashMap<&'static str, u64>,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub item_count: usize,
    pub operations: BTreeMap<String, u64>,
    pub errors: BTreeMap<String, u64>,
}

impl InventoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, operation: &'static str) {
        *self.operations.entry(operation).or_insert(0) += 1;
    }

    pub fn record_error(&self, err: &InventoryError) {
        *self.errors.entry(err.kind()).or_insert(0) += 1;
    }

    /// Counts `operation` and, on failure, the error kind; passes `result` through.
    pub fn track<T>(&self, operation: &'static str, result: InventoryResult<T>) -> InventoryResult<T> {
        self.record(operation);
        if let Err(err) = &result {
            self.record_error(err);
        }
        result
    }

    pub fn operation_count(&self, operation: &str) -> u64 {
        self.operations.get(operation).map(|count| *count).unwrap_or(0)
    }

    pub fn error_count(&self, kind: &str) -> u64 {
        self.errors.get(kind).map(|count| *count).unwrap_or(0)
    }

    pub fn snapshot(&self, item_count: usize) -> MetricsSnapshot {
        let collect = |map: &DashMap<&'static str, u64>| {
            map.iter()
                .map(|entry| (entry.key().to_string(), *entry.value()))
                .collect::<BTreeMap<_, _>>()
        };

        MetricsSnapshot {
            item_count,
            operations: collect(&self.operations),
            errors: collect(&self.errors),
        }
    }
}
