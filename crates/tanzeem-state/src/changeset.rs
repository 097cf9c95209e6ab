//! Staged writes for one unit of work.
//!
//! Records are keyed by their natural key, so staging the same key twice
//! keeps only the last version.

use std::collections::BTreeMap;

use tanzeem_protocol::{Account, ChandaNo, ExternalJamaatId, Jamaat, Member};

/// Pending creates and updates, committed by `HierarchyStore::flush`.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    jamaats: BTreeMap<ExternalJamaatId, Jamaat>,
    members: BTreeMap<ChandaNo, Member>,
    accounts: BTreeMap<ChandaNo, Account>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a Jamaat, replacing any earlier version with the same key.
    pub fn stage_jamaat(&mut self, jamaat: Jamaat) -> Option<Jamaat> {
        self.jamaats.insert(jamaat.jamaat_no, jamaat)
    }

    pub fn staged_jamaat(&self, jamaat_no: ExternalJamaatId) -> Option<&Jamaat> {
        self.jamaats.get(&jamaat_no)
    }

    pub fn stage_member(&mut self, member: Member) -> Option<Member> {
        self.members.insert(member.chanda_no.clone(), member)
    }

    pub fn staged_member(&self, chanda_no: &ChandaNo) -> Option<&Member> {
        self.members.get(chanda_no)
    }

    pub fn stage_account(&mut self, account: Account) -> Option<Account> {
        self.accounts.insert(account.chanda_no.clone(), account)
    }

    pub fn jamaats(&self) -> impl Iterator<Item = &Jamaat> {
        self.jamaats.values()
    }

    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Total number of staged records across all collections.
    pub fn len(&self) -> usize {
        self.jamaats.len() + self.members.len() + self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_stage_wins() {
        let mut changes = ChangeSet::new();
        let key = ExternalJamaatId::new(9);
        changes.stage_jamaat(Jamaat::new(key, "First"));
        let replaced = changes.stage_jamaat(Jamaat::new(key, "Second"));
        assert_eq!(replaced.map(|j| j.name), Some("First".to_string()));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes.staged_jamaat(key).unwrap().name, "Second");
    }

    #[test]
    fn test_empty() {
        assert!(ChangeSet::new().is_empty());
    }
}
