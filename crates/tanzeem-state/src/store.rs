//! The query and flush surface shared by resolver, mapping and sync.
//!
//! Lookups are synchronous: they never suspend and are expected to be served
//! from memory or a local cache. Writes are staged in a [`ChangeSet`] and
//! committed in one `flush`, which is the transaction boundary.

use async_trait::async_trait;

use tanzeem_protocol::*;

use crate::{ChangeSet, StateError};

#[async_trait]
pub trait HierarchyStore: Send + Sync {
    fn zone(&self, id: &ZoneId) -> Result<Option<Zone>, StateError>;

    fn dila(&self, id: &DilaId) -> Result<Option<Dila>, StateError>;

    fn muqam(&self, id: &MuqamId) -> Result<Option<Muqam>, StateError>;

    fn jamaat(&self, id: &JamaatId) -> Result<Option<Jamaat>, StateError>;

    /// Look up a Jamaat by its external key.
    fn jamaat_by_no(&self, jamaat_no: ExternalJamaatId) -> Result<Option<Jamaat>, StateError>;

    fn jamaats(&self) -> Result<Vec<Jamaat>, StateError>;

    fn member_by_chanda_no(&self, chanda_no: &ChandaNo) -> Result<Option<Member>, StateError>;

    fn members(&self) -> Result<Vec<Member>, StateError>;

    fn account_by_chanda_no(&self, chanda_no: &ChandaNo) -> Result<Option<Account>, StateError>;

    /// Commit every staged record atomically.
    ///
    /// Either all records become visible or none do.
    async fn flush(&self, changes: ChangeSet) -> Result<(), StateError>;
}
