//! Inventory Registry - Core Library
//!
//! An in-memory inventory registry with per-item activity tracking and
//! aggregate queries, served over a small REST API.

pub mod apply;
pub mod cli;
pub mod inventory;
pub mod metrics;
pub mod middleware;
pub mod server;
pub mod settings;
pub mod telemetry;

pub use inventory::{Inventory, InventoryError, InventoryItem, QueryMode};
