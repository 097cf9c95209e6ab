//! The external directory seam.

use async_trait::async_trait;
use thiserror::Error;

use tanzeem_protocol::{ExternalJamaat, ExternalMember};

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Directory unreachable: {0}")]
    Unreachable(String),

    #[error("Directory request timed out after {0}s")]
    Timeout(u64),

    #[error("Malformed directory response: {0}")]
    Malformed(String),
}

/// Client for the authoritative external directory.
///
/// Each call returns the complete current set. Calls must be safe to
/// repeat.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn fetch_jamaats(&self) -> Result<Vec<ExternalJamaat>, DirectoryError>;

    async fn fetch_members(&self) -> Result<Vec<ExternalMember>, DirectoryError>;
}
