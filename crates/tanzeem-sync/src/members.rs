//! Member reconciliation, keyed on ChandaNo.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use tanzeem_protocol::*;
use tanzeem_state::{ChangeSet, HierarchyStore};

use crate::engine::{non_blank, required, SyncConfig, SyncEngine, SyncTarget, Upsert};
use crate::{DirectoryClient, ItemError, SyncError};

/// Member collection as a sync target.
pub struct Members;

impl SyncTarget for Members {
    type Record = ExternalMember;

    const KIND: &'static str = MEMBER_RECORD_KIND;

    fn record_key(record: &ExternalMember) -> String {
        record.chanda_no.trim().to_string()
    }

    fn upsert(
        store: &dyn HierarchyStore,
        record: ExternalMember,
        changes: &mut ChangeSet,
    ) -> Result<Upsert, ItemError> {
        let chanda_no =
            ChandaNo::parse(&record.chanda_no).map_err(|e| ItemError::Invalid(e.to_string()))?;
        let first_name = required(&record.first_name, "first name")?;
        let last_name = record.last_name.trim().to_string();

        let existing = match changes.staged_member(&chanda_no) {
            Some(staged) => Some(staged.clone()),
            None => store.member_by_chanda_no(&chanda_no)?,
        };

        // ChandaNo, local id and the direct Muqam link are never rewritten.
        let (mut member, outcome) = match existing {
            Some(mut member) => {
                member.updated_on = Some(Utc::now());
                (member, Upsert::Updated)
            }
            None => (
                Member::new(chanda_no, first_name.clone(), last_name.clone()),
                Upsert::Created,
            ),
        };
        member.first_name = first_name;
        member.middle_name = non_blank(record.middle_name);
        member.last_name = last_name;
        member.email = non_blank(record.email);
        member.photo_url = non_blank(record.photo_url);
        member.jamaat_no = record.jamaat_id.map(ExternalJamaatId::new);

        changes.stage_member(member);
        Ok(outcome)
    }
}

/// Reconciles local Members against the directory.
pub struct MemberReconciler {
    directory: Arc<dyn DirectoryClient>,
    engine: SyncEngine,
}

impl MemberReconciler {
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

    /// Run one full Member sync.
    pub async fn sync(&self, cancel: &CancellationToken) -> Result<SyncResult, SyncError> {
        self.engine
            .run::<Members, _>(self.directory.fetch_members(), cancel)
            .await
    }
}
