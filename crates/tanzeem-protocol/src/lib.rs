//! Tanzeem - Core types for the membership directory
//!
//! Shared vocabulary for the hierarchy (Zone → Dila → Muqam → Jamaat → Member),
//! the domain events emitted by mapping changes, and the record shapes
//! delivered by the external directory feed.

pub mod constants;
pub mod error;
pub mod events;
pub mod identity;
pub mod records;
pub mod types;

pub use constants::*;
pub use error::*;
pub use events::*;
pub use identity::*;
pub use records::*;
pub use types::*;
