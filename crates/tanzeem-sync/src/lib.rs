//! Tanzeem Sync - reconciliation against the external directory
//!
//! Pulls the full Jamaat or Member set from the directory, upserts each
//! record by natural key and commits the batch in one flush:
//! - Per-record failures are counted and reported, never fatal
//! - Transport, persistence and cancellation abort the whole run
//! - Locally owned fields (such as a Jamaat's Muqam) are never touched

pub mod directory;
pub mod engine;
pub mod jamaats;
pub mod members;

pub use directory::{DirectoryClient, DirectoryError};
pub use engine::{SyncConfig, SyncEngine};
pub use jamaats::JamaatReconciler;
pub use members::MemberReconciler;

use serde::{Deserialize, Serialize};
use tanzeem_state::StateError;
use thiserror::Error;

/// Errors that abort a whole reconciliation run.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Directory fetch failed: {0}")]
    Transport(#[from] DirectoryError),

    #[error("Flush failed: {0}")]
    Persistence(#[from] StateError),

    #[error("Sync cancelled")]
    Cancelled,
}

/// Failure of a single record. Captured into the run's error list.
#[derive(Error, Debug)]
pub enum ItemError {
    #[error("{0}")]
    Invalid(String),

    #[error("lookup failed: {0}")]
    Lookup(#[from] StateError),
}

/// The two independent reconciliation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncKind {
    Jamaats,
    Members,
}

impl std::fmt::Display for SyncKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncKind::Jamaats => write!(f, "jamaats"),
            SyncKind::Members => write!(f, "members"),
        }
    }
}
