//! Tanzeem Hierarchy - ancestor resolution and Jamaat mapping
//!
//! Implements the organizational side of the directory:
//! - Resolution of a member's Muqam/Dila/Zone chain and organization level
//! - Jamaat-to-Muqam mapping with remap and unmap, emitting domain events
//! - Mapping coverage statistics
//! - Account provisioning with a cached hierarchy context

pub mod events;
pub mod mapping;
pub mod registration;
pub mod resolver;

pub use events::{EventSink, RecordingSink, TracingSink};
pub use mapping::{MappingManager, MappingOutcome};
pub use registration::AccountProvisioner;
pub use resolver::{HierarchyResolver, MemberRef};

use tanzeem_state::StateError;
use thiserror::Error;

/// Errors originating from the hierarchy layer.
#[derive(Error, Debug)]
pub enum HierarchyError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Store error: {0}")]
    Store(#[from] StateError),
}

impl HierarchyError {
    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        HierarchyError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}
