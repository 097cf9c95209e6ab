//! Account provisioning for members joining through registration.
//!
//! An account is keyed by the member's ChandaNo and caches the member's
//! resolved hierarchy context so that callers do not need to walk the
//! hierarchy on every request. The cache goes stale when the member's
//! Jamaat is remapped; `refresh` recomputes it.

use std::sync::Arc;

use tanzeem_protocol::*;
use tanzeem_state::{ChangeSet, HierarchyStore};

use crate::resolver::{HierarchyResolver, MemberRef};
use crate::HierarchyError;

pub struct AccountProvisioner {
    store: Arc<dyn HierarchyStore>,
    resolver: HierarchyResolver,
}

impl AccountProvisioner {
    pub fn new(store: Arc<dyn HierarchyStore>) -> Self {
        Self {
            resolver: HierarchyResolver::new(store.clone()),
            store,
        }
    }

    /// Create an account for an existing member.
    ///
    /// Falls back to the member's directory email when none is given.
    pub async fn provision(
        &self,
        chanda_no: &ChandaNo,
        email: Option<String>,
    ) -> Result<Account, HierarchyError> {
        let member = self
            .store
            .member_by_chanda_no(chanda_no)?
            .ok_or_else(|| HierarchyError::not_found(MemberId::kind(), chanda_no))?;

        if self.store.account_by_chanda_no(chanda_no)?.is_some() {
            return Err(HierarchyError::InvalidState(format!(
                "Account already provisioned for ChandaNo {}",
                chanda_no
            )));
        }

        let context = self.resolver.resolve(&MemberRef::from(&member));
        let account = Account::new(chanda_no.clone(), email.or(member.email), context);

        let mut changes = ChangeSet::new();
        changes.stage_account(account.clone());
        self.store.flush(changes).await?;

        tracing::info!(
            chanda_no = %chanda_no,
            level = ?account.organization_level,
            "Account provisioned"
        );
        Ok(account)
    }

    /// Recompute an account's cached hierarchy context.
    pub async fn refresh(&self, chanda_no: &ChandaNo) -> Result<Account, HierarchyError> {
        let mut account = self
            .store
            .account_by_chanda_no(chanda_no)?
            .ok_or_else(|| HierarchyError::not_found(AccountId::kind(), chanda_no))?;
        let member = self
            .store
            .member_by_chanda_no(chanda_no)?
            .ok_or_else(|| HierarchyError::not_found(MemberId::kind(), chanda_no))?;

        let context = self.resolver.resolve(&MemberRef::from(&member));
        if account.context() == context {
            return Ok(account);
        }

        account.apply_context(&context);
        let mut changes = ChangeSet::new();
        changes.stage_account(account.clone());
        self.store.flush(changes).await?;

        tracing::info!(
            chanda_no = %chanda_no,
            level = ?account.organization_level,
            "Account hierarchy refreshed"
        );
        Ok(account)
    }

    /// Hierarchy context a registration would receive, without provisioning.
    pub fn preview(&self, hint: &MemberRef) -> HierarchyContext {
        self.resolver.resolve(hint)
    }
}
