//! In-memory inventory core: item store, activity tracking and the query engine.
//!
//! Nothing in here knows about HTTP. The server module translates these
//! typed results into responses.

pub mod activity;
pub mod error;
pub mod item;
pub mod query;
pub mod registry;
pub mod store;

pub use activity::{ActivityRecord, ActivityTracker};
pub use error::{InventoryError, InventoryResult};
pub use item::{normalize_key, InventoryItem, ItemPayload};
pub use query::{QueryMode, Snapshot};
pub use registry::{seed_items, BatchSummary, Inventory, InventoryExport};
pub use store::{InventoryStore, UpsertOutcome};
