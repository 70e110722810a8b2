//! Inventory error types.

use thiserror::Error;

/// Errors produced by the inventory core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// A required field is missing or blank
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No item exists for the key
    #[error("Item not found: {0}")]
    NotFound(String),

    /// Strict create hit an existing key
    #[error("Item already exists: {0}")]
    AlreadyExists(String),

    /// The item and activity ledgers disagree about a key
    #[error("Inventory and activity ledgers diverged for key {0}")]
    InternalConsistency(String),
}

impl InventoryError {
    /// Stable machine-readable name for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NotFound(_) => "not_found",
            Self::AlreadyExists(_) => "conflict",
            Self::InternalConsistency(_) => "internal",
        }
    }
}

/// Result type alias using InventoryError.
pub type InventoryResult<T> = Result<T, InventoryError>;
