//! Ancestor resolution: Member → Muqam → Dila → Zone.
//!
//! The starting Muqam is chosen by priority:
//! 1. The Muqam of the member's Jamaat, if the Jamaat is known and mapped
//! 2. The member's direct Muqam link
//! 3. Nothing, in which case every field is absent
//!
//! The starting Muqam id is always reported. The walk upwards stops at the
//! first row that cannot be found: finer fields are kept, coarser ones stay
//! absent.
//! Resolution never fails: lookup errors are logged and treated as a
//! missing row.

use std::sync::Arc;

use tanzeem_protocol::*;
use tanzeem_state::{HierarchyStore, StateError};

/// The hierarchy-relevant links carried by a member or registration hint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberRef {
    pub jamaat_no: Option<ExternalJamaatId>,
    pub muqam_id: Option<MuqamId>,
}

impl MemberRef {
    pub fn new(jamaat_no: Option<ExternalJamaatId>, muqam_id: Option<MuqamId>) -> Self {
        Self {
            jamaat_no,
            muqam_id,
        }
    }
}

impl From<&Member> for MemberRef {
    fn from(member: &Member) -> Self {
        Self {
            jamaat_no: member.jamaat_no,
            muqam_id: member.muqam_id,
        }
    }
}

/// Resolves hierarchy context from store lookups.
#[derive(Clone)]
pub struct HierarchyResolver {
    store: Arc<dyn HierarchyStore>,
}

impl HierarchyResolver {
    pub fn new(store: Arc<dyn HierarchyStore>) -> Self {
        Self { store }
    }

    /// Resolve the ancestor chain and organization level for a member.
    pub fn resolve(&self, member: &MemberRef) -> HierarchyContext {
        let start = member
            .jamaat_no
            .and_then(|jamaat_no| self.jamaat_muqam(jamaat_no))
            .or(member.muqam_id);

        match start {
            Some(muqam_id) => self.walk_from_muqam(muqam_id),
            None => HierarchyContext::default(),
        }
    }

    /// Resolve the chain for a Muqam directly.
    pub fn walk_from_muqam(&self, muqam_id: MuqamId) -> HierarchyContext {
        let Some(muqam) = lookup(self.store.muqam(&muqam_id)) else {
            tracing::debug!(muqam = %muqam_id, "Muqam not found, hierarchy truncated");
            return HierarchyContext::from_chain(Some(muqam_id), None, None);
        };

        let Some(dila) = lookup(self.store.dila(&muqam.dila_id)) else {
            tracing::debug!(muqam = %muqam_id, dila = %muqam.dila_id, "Dila not found, hierarchy truncated");
            return HierarchyContext::from_chain(Some(muqam_id), None, None);
        };

        let zone_id = lookup(self.store.zone(&dila.zone_id)).map(|zone| zone.id);
        if zone_id.is_none() {
            tracing::debug!(dila = %dila.id, zone = %dila.zone_id, "Zone not found, hierarchy truncated");
        }

        HierarchyContext::from_chain(Some(muqam_id), Some(dila.id), zone_id)
    }

    fn jamaat_muqam(&self, jamaat_no: ExternalJamaatId) -> Option<MuqamId> {
        lookup(self.store.jamaat_by_no(jamaat_no)).and_then(|jamaat| jamaat.muqam_id)
    }
}

/// Collapse a lookup result to an `Option`, logging store failures.
fn lookup<T>(result: Result<Option<T>, StateError>) -> Option<T> {
    match result {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(error = %e, "Hierarchy lookup failed, treating as missing");
            None
        }
    }
}
