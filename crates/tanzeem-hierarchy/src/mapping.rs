//! Jamaat-to-Muqam mapping.
//!
//! Each Jamaat is either unmapped or mapped to exactly one Muqam:
//!
//! ```text
//! Unmapped  --map(m)-->   Mapped(m)
//! Mapped(m) --map(m')-->  Mapped(m')   previous association replaced
//! Mapped(m) --map(m)-->   Mapped(m)    no write, no event
//! Mapped(m) --unmap-->    Unmapped
//! Unmapped  --unmap-->    rejected with InvalidState
//! ```
//!
//! Every change is a single-record write flushed through the store. Events
//! are collected per operation and published only after the flush succeeded.

use std::sync::Arc;

use chrono::Utc;

use tanzeem_protocol::*;
use tanzeem_state::{ChangeSet, HierarchyStore};

use crate::events::EventSink;
use crate::HierarchyError;

/// What a successful `map` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingOutcome {
    /// The Jamaat was unmapped and is now mapped.
    Mapped,
    /// The Jamaat moved from `previous` to the requested Muqam.
    Remapped { previous: MuqamId },
    /// The Jamaat was already mapped to the requested Muqam.
    Unchanged,
}

impl MappingOutcome {
    pub fn is_noop(&self) -> bool {
        matches!(self, MappingOutcome::Unchanged)
    }
}

/// Maintains the Jamaat → Muqam association.
pub struct MappingManager {
    store: Arc<dyn HierarchyStore>,
    sink: Arc<dyn EventSink>,
}

impl MappingManager {
    pub fn new(store: Arc<dyn HierarchyStore>, sink: Arc<dyn EventSink>) -> Self {
        Self { store, sink }
    }

    /// Map a Jamaat to a Muqam, replacing any previous association.
    pub async fn map(
        &self,
        jamaat_id: JamaatId,
        muqam_id: MuqamId,
    ) -> Result<MappingOutcome, HierarchyError> {
        let mut jamaat = self
            .store
            .jamaat(&jamaat_id)?
            .ok_or_else(|| HierarchyError::not_found(JamaatId::kind(), jamaat_id))?;

        if self.store.muqam(&muqam_id)?.is_none() {
            return Err(HierarchyError::not_found(MuqamId::kind(), muqam_id));
        }

        let outcome = match jamaat.muqam_id {
            Some(current) if current == muqam_id => {
                tracing::debug!(jamaat = %jamaat_id, muqam = %muqam_id, "Jamaat already mapped to Muqam");
                return Ok(MappingOutcome::Unchanged);
            }
            Some(previous) => MappingOutcome::Remapped { previous },
            None => MappingOutcome::Mapped,
        };

        jamaat.muqam_id = Some(muqam_id);
        jamaat.updated_on = Some(Utc::now());
        let events = vec![DomainEvent::jamaat_mapped(jamaat_id, muqam_id)];

        self.commit(jamaat, events).await?;

        match outcome {
            MappingOutcome::Remapped { previous } => tracing::info!(
                jamaat = %jamaat_id,
                muqam = %muqam_id,
                previous = %previous,
                "Jamaat remapped"
            ),
            _ => tracing::info!(jamaat = %jamaat_id, muqam = %muqam_id, "Jamaat mapped"),
        }

        Ok(outcome)
    }

    /// Map a Jamaat identified by its external key.
    pub async fn map_by_no(
        &self,
        jamaat_no: ExternalJamaatId,
        muqam_id: MuqamId,
    ) -> Result<MappingOutcome, HierarchyError> {
        let jamaat_id = self.jamaat_id_for(jamaat_no)?;
        self.map(jamaat_id, muqam_id).await
    }

    /// Clear a Jamaat's Muqam. Returns the Muqam it was mapped to.
    pub async fn unmap(&self, jamaat_id: JamaatId) -> Result<MuqamId, HierarchyError> {
        let mut jamaat = self
            .store
            .jamaat(&jamaat_id)?
            .ok_or_else(|| HierarchyError::not_found(JamaatId::kind(), jamaat_id))?;

        let previous = jamaat.muqam_id.ok_or_else(|| {
            HierarchyError::InvalidState(format!("Jamaat {} is not mapped to any Muqam", jamaat_id))
        })?;

        jamaat.muqam_id = None;
        jamaat.updated_on = Some(Utc::now());
        let events = vec![DomainEvent::jamaat_unmapped(jamaat_id, previous)];

        self.commit(jamaat, events).await?;

        tracing::info!(jamaat = %jamaat_id, previous = %previous, "Jamaat unmapped");
        Ok(previous)
    }

    /// Unmap a Jamaat identified by its external key.
    pub async fn unmap_by_no(&self, jamaat_no: ExternalJamaatId) -> Result<MuqamId, HierarchyError> {
        let jamaat_id = self.jamaat_id_for(jamaat_no)?;
        self.unmap(jamaat_id).await
    }

    /// Mapping coverage across all Jamaats.
    pub fn stats(&self) -> Result<MappingStats, HierarchyError> {
        let jamaats = self.store.jamaats()?;
        let mapped = jamaats.iter().filter(|j| j.is_mapped()).count();
        Ok(MappingStats::from_counts(jamaats.len() as u64, mapped as u64))
    }

    /// Jamaats currently mapped to the given Muqam.
    pub fn jamaats_for_muqam(&self, muqam_id: MuqamId) -> Result<Vec<Jamaat>, HierarchyError> {
        Ok(self
            .store
            .jamaats()?
            .into_iter()
            .filter(|j| j.muqam_id == Some(muqam_id))
            .collect())
    }

    /// Jamaats that have no Muqam yet.
    pub fn unmapped_jamaats(&self) -> Result<Vec<Jamaat>, HierarchyError> {
        Ok(self
            .store
            .jamaats()?
            .into_iter()
            .filter(|j| !j.is_mapped())
            .collect())
    }

    fn jamaat_id_for(&self, jamaat_no: ExternalJamaatId) -> Result<JamaatId, HierarchyError> {
        self.store
            .jamaat_by_no(jamaat_no)?
            .map(|j| j.id)
            .ok_or_else(|| HierarchyError::not_found(JamaatId::kind(), jamaat_no))
    }

    async fn commit(&self, jamaat: Jamaat, events: Vec<DomainEvent>) -> Result<(), HierarchyError> {
        let mut changes = ChangeSet::new();
        changes.stage_jamaat(jamaat);
        self.store.flush(changes).await?;

        for event in &events {
            self.sink.publish(event);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingSink;
    use tanzeem_state::MemoryStore;

    #[tokio::test]
    async fn test_unknown_jamaat_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let manager = MappingManager::new(store, Arc::new(RecordingSink::new()));
        let err = manager
            .map(JamaatId::generate(), MuqamId::generate())
            .await
            .unwrap_err();
        assert!(matches!(err, HierarchyError::NotFound { kind: "Jamaat", .. }));
    }

    #[test]
    fn test_stats_empty() {
        let manager = MappingManager::new(Arc::new(MemoryStore::new()), Arc::new(RecordingSink::new()));
        let stats = manager.stats().unwrap();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.mapping_percentage, 0.0);
    }
}
