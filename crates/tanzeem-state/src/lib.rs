//! Tanzeem State - hierarchy store and change staging
//!
//! Provides the persistence seam used by every other component:
//! - `HierarchyStore` trait: non-suspending lookups plus one async flush
//! - `ChangeSet` for staging creates/updates keyed by natural key
//! - `MemoryStore`, an in-process implementation with optional JSON
//!   snapshot persistence

pub mod changeset;
pub mod memory;
pub mod store;

pub use changeset::ChangeSet;
pub use memory::{MemoryStore, StoreSnapshot};
pub use store::HierarchyStore;

use thiserror::Error;

/// Errors originating from the state layer.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Missing parent {kind} {id}")]
    MissingParent { kind: &'static str, id: String },

    #[error("Unique key conflict on {kind}: {key}")]
    Conflict { kind: &'static str, key: String },

    #[error("Stale write to {id}: stored version {expected}, write based on {got}")]
    StaleVersion { id: String, expected: u64, got: u64 },

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
