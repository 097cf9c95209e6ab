//! Jamaat reconciliation, keyed on the external Jamaat id.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use tanzeem_protocol::*;
use tanzeem_state::{ChangeSet, HierarchyStore};

use crate::engine::{non_blank, required, SyncConfig, SyncEngine, SyncTarget, Upsert};
use crate::{DirectoryClient, ItemError, SyncError};

/// Jamaat collection as a sync target.
pub struct Jamaats;

impl SyncTarget for Jamaats {
    type Record = ExternalJamaat;

    const KIND: &'static str = JAMAAT_RECORD_KIND;

    fn record_key(record: &ExternalJamaat) -> String {
        record.jamaat_id.to_string()
    }

    fn upsert(
        store: &dyn HierarchyStore,
        record: ExternalJamaat,
        changes: &mut ChangeSet,
    ) -> Result<Upsert, ItemError> {
        if record.jamaat_id <= 0 {
            return Err(ItemError::Invalid(format!(
                "external id must be positive, got {}",
                record.jamaat_id
            )));
        }
        let jamaat_no = ExternalJamaatId::new(record.jamaat_id);
        let name = required(&record.name, "name")?;

        let existing = match changes.staged_jamaat(jamaat_no) {
            Some(staged) => Some(staged.clone()),
            None => store.jamaat_by_no(jamaat_no)?,
        };

        // Only directory-sourced fields are written; muqam_id stays as mapped.
        let (mut jamaat, outcome) = match existing {
            Some(mut jamaat) => {
                jamaat.updated_on = Some(Utc::now());
                (jamaat, Upsert::Updated)
            }
            None => (Jamaat::new(jamaat_no, name.clone()), Upsert::Created),
        };
        jamaat.name = name;
        jamaat.code = non_blank(record.code);
        jamaat.circuit_name = non_blank(record.circuit_name);

        changes.stage_jamaat(jamaat);
        Ok(outcome)
    }
}

/// Reconciles local Jamaats against the directory.
pub struct JamaatReconciler {
    directory: Arc<dyn DirectoryClient>,
    engine: SyncEngine,
}

impl JamaatReconciler {
    pub fn new(
        directory: Arc<dyn DirectoryClient>,
        store: Arc<dyn HierarchyStore>,
        config: SyncConfig,
    ) -> Self {
        Self {
            directory,
            engine: SyncEngine::new(store, config),
        }
    }

    /// Run one full Jamaat sync.
    pub async fn sync(&self, cancel: &CancellationToken) -> Result<SyncResult, SyncError> {
        self.engine
            .run::<Jamaats, _>(self.directory.fetch_jamaats(), cancel)
            .await
    }
}
