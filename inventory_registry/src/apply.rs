//! Offline batch application of an items file.
//!
//! Reads a JSON array of items, upserts them into a fresh inventory in one
//! batch and reports the resulting items with their activity counts.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tracing::{info, instrument};

use crate::inventory::{ActivityRecord, BatchSummary, Inventory, InventoryItem, ItemPayload};

/// Result of applying an items file
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReport {
    pub summary: BatchSummary,
    pub items: Vec<InventoryItem>,
    pub activity: Vec<ActivityRecord>,
}

/// Load and validate every item in a JSON array file
pub fn load_items(path: &Path) -> Result<Vec<InventoryItem>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read items file {}", path.display()))?;
    let payloads: Vec<ItemPayload> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse items file {}", path.display()))?;

    payloads
        .into_iter()
        .enumerate()
        .map(|(index, payload)| {
            payload
                .validate()
                .with_context(|| format!("Invalid item at index {}", index))
        })
        .collect()
}

/// Apply the items in `path` to a fresh inventory
#[instrument]
pub fn run(path: &Path, seed: bool) -> Result<ApplyReport> {
    let inventory = if seed { Inventory::seeded() } else { Inventory::new() };
    let items = load_items(path)?;

    let summary = inventory.upsert_many(items)?;
    info!(created = summary.created, updated = summary.updated, "Applied items file");

    let export = inventory.export();
    Ok(ApplyReport {
        summary,
        items: export.items,
        activity: export.activity,
    })
}
