//! In-process hierarchy store with optional JSON snapshot persistence.
//!
//! All collections live behind one `RwLock`. A flush applies the staged
//! records to a copy of the tables, persists the copy when a snapshot path
//! is configured, and only then swaps the Jamaat, Member and Account
//! collections in. A failed flush therefore leaves both the in-memory state
//! and the snapshot file untouched. Zones, Dilas and Muqams seeded while a
//! flush is writing are kept in memory and reach the file on the next
//! flush or `save`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use tanzeem_protocol::*;

use crate::{ChangeSet, HierarchyStore, StateError};

/// Serialized form of the whole store, one array per collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub dilas: Vec<Dila>,
    #[serde(default)]
    pub muqams: Vec<Muqam>,
    #[serde(default)]
    pub jamaats: Vec<Jamaat>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub accounts: Vec<Account>,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    zones: HashMap<ZoneId, Zone>,
    dilas: HashMap<DilaId, Dila>,
    muqams: HashMap<MuqamId, Muqam>,
    jamaats: HashMap<JamaatId, Jamaat>,
    /// External key -> local id.
    jamaat_index: HashMap<ExternalJamaatId, JamaatId>,
    members: HashMap<ChandaNo, Member>,
    accounts: HashMap<ChandaNo, Account>,
}

impl Tables {
    fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, StateError> {
        let mut tables = Tables {
            zones: snapshot.zones.into_iter().map(|z| (z.id, z)).collect(),
            dilas: snapshot.dilas.into_iter().map(|d| (d.id, d)).collect(),
            muqams: snapshot.muqams.into_iter().map(|m| (m.id, m)).collect(),
            ..Default::default()
        };
        for jamaat in snapshot.jamaats {
            tables.upsert_jamaat(jamaat)?;
        }
        for member in snapshot.members {
            tables.upsert_member(member)?;
        }
        for account in snapshot.accounts {
            tables.upsert_account(account)?;
        }
        Ok(tables)
    }

    fn to_snapshot(&self) -> StoreSnapshot {
        let mut snapshot = StoreSnapshot {
            zones: self.zones.values().cloned().collect(),
            dilas: self.dilas.values().cloned().collect(),
            muqams: self.muqams.values().cloned().collect(),
            jamaats: self.jamaats.values().cloned().collect(),
            members: self.members.values().cloned().collect(),
            accounts: self.accounts.values().cloned().collect(),
        };
        // Stable ordering keeps snapshot diffs readable.
        snapshot.zones.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        snapshot.dilas.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        snapshot.muqams.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        snapshot.jamaats.sort_by_key(|j| j.jamaat_no);
        snapshot.members.sort_by(|a, b| a.chanda_no.cmp(&b.chanda_no));
        snapshot.accounts.sort_by(|a, b| a.chanda_no.cmp(&b.chanda_no));
        snapshot
    }

    fn upsert_jamaat(&mut self, jamaat: Jamaat) -> Result<(), StateError> {
        if let Some(owner) = self.jamaat_index.get(&jamaat.jamaat_no) {
            if *owner != jamaat.id {
                return Err(StateError::Conflict {
                    kind: JamaatId::kind(),
                    key: jamaat.jamaat_no.to_string(),
                });
            }
        }
        if let Some(existing) = self.jamaats.get(&jamaat.id) {
            if existing.jamaat_no != jamaat.jamaat_no {
                return Err(StateError::Conflict {
                    kind: JamaatId::kind(),
                    key: jamaat.id.to_string(),
                });
            }
            if existing.version != jamaat.version {
                return Err(StateError::StaleVersion {
                    id: jamaat.id.to_string(),
                    expected: existing.version,
                    got: jamaat.version,
                });
            }
        }
        self.jamaat_index.insert(jamaat.jamaat_no, jamaat.id);
        self.jamaats.insert(jamaat.id, jamaat);
        Ok(())
    }

    /// Like `upsert_jamaat`, but for writes coming through a flush: the
    /// stored row gets the next version number.
    fn commit_jamaat(&mut self, mut jamaat: Jamaat) -> Result<(), StateError> {
        self.upsert_jamaat(jamaat.clone())?;
        jamaat.version += 1;
        self.jamaats.insert(jamaat.id, jamaat);
        Ok(())
    }

    fn upsert_member(&mut self, member: Member) -> Result<(), StateError> {
        if let Some(existing) = self.members.get(&member.chanda_no) {
            if existing.id != member.id {
                return Err(StateError::Conflict {
                    kind: MemberId::kind(),
                    key: member.chanda_no.to_string(),
                });
            }
        }
        self.members.insert(member.chanda_no.clone(), member);
        Ok(())
    }

    fn upsert_account(&mut self, account: Account) -> Result<(), StateError> {
        if let Some(existing) = self.accounts.get(&account.chanda_no) {
            if existing.id != account.id {
                return Err(StateError::Conflict {
                    kind: AccountId::kind(),
                    key: account.chanda_no.to_string(),
                });
            }
        }
        self.accounts.insert(account.chanda_no.clone(), account);
        Ok(())
    }

    /// Take the flush-owned collections from `other`, keeping this table's
    /// Zones, Dilas and Muqams. Seeding writes those outside the flush lock.
    fn adopt_catalog(&mut self, other: Tables) {
        self.jamaats = other.jamaats;
        self.jamaat_index = other.jamaat_index;
        self.members = other.members;
        self.accounts = other.accounts;
    }

    fn apply(&mut self, changes: ChangeSet) -> Result<(), StateError> {
        for jamaat in changes.jamaats() {
            self.commit_jamaat(jamaat.clone())?;
        }
        for member in changes.members() {
            self.upsert_member(member.clone())?;
        }
        for account in changes.accounts() {
            self.upsert_account(account.clone())?;
        }
        Ok(())
    }
}

/// Hierarchy store kept in memory, optionally mirrored to a JSON file.
pub struct MemoryStore {
    tables: RwLock<Tables>,
    snapshot_path: Option<PathBuf>,
    /// Serializes flushes so the copy-apply-swap sequence never interleaves.
    flush_lock: Mutex<()>,
}

impl MemoryStore {
    /// Create an empty, purely in-memory store.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            snapshot_path: None,
            flush_lock: Mutex::new(()),
        }
    }

    /// Create an in-memory store pre-populated from a snapshot.
    ///
    /// Parent references are taken as-is: the administrative side owns
    /// Zone/Dila/Muqam integrity. Natural-key uniqueness is enforced.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, StateError> {
        Ok(Self {
            tables: RwLock::new(Tables::from_snapshot(snapshot)?),
            snapshot_path: None,
            flush_lock: Mutex::new(()),
        })
    }

    /// Open a store backed by a snapshot file.
    ///
    /// A missing file yields an empty store; the file is created by the
    /// first flush.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StateError> {
        let path = path.as_ref().to_path_buf();
        let tables = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let snapshot: StoreSnapshot = serde_json::from_slice(&bytes)?;
                Tables::from_snapshot(snapshot)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Store snapshot not found, starting empty");
                Tables::default()
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            path = %path.display(),
            jamaats = tables.jamaats.len(),
            members = tables.members.len(),
            "Store opened"
        );

        Ok(Self {
            tables: RwLock::new(tables),
            snapshot_path: Some(path),
            flush_lock: Mutex::new(()),
        })
    }

    /// Path of the backing snapshot file, if any.
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Export the current contents.
    pub fn snapshot(&self) -> Result<StoreSnapshot, StateError> {
        Ok(self.read()?.to_snapshot())
    }

    pub fn insert_zone(&self, zone: Zone) -> Result<ZoneId, StateError> {
        let id = zone.id;
        self.write()?.zones.insert(id, zone);
        Ok(id)
    }

    /// Insert a Dila. Its Zone must already exist.
    pub fn insert_dila(&self, dila: Dila) -> Result<DilaId, StateError> {
        let mut tables = self.write()?;
        if !tables.zones.contains_key(&dila.zone_id) {
            return Err(StateError::MissingParent {
                kind: ZoneId::kind(),
                id: dila.zone_id.to_string(),
            });
        }
        let id = dila.id;
        tables.dilas.insert(id, dila);
        Ok(id)
    }

    /// Insert a Muqam. Its Dila must already exist.
    pub fn insert_muqam(&self, muqam: Muqam) -> Result<MuqamId, StateError> {
        let mut tables = self.write()?;
        if !tables.dilas.contains_key(&muqam.dila_id) {
            return Err(StateError::MissingParent {
                kind: DilaId::kind(),
                id: muqam.dila_id.to_string(),
            });
        }
        let id = muqam.id;
        tables.muqams.insert(id, muqam);
        Ok(id)
    }

    pub fn muqams(&self) -> Result<Vec<Muqam>, StateError> {
        Ok(self.read()?.muqams.values().cloned().collect())
    }

    /// Write the current contents to the snapshot file, if one is configured.
    pub async fn save(&self) -> Result<(), StateError> {
        let _guard = self.flush_lock.lock().await;
        let snapshot = self.snapshot()?;
        if let Some(path) = &self.snapshot_path {
            write_snapshot(path, &snapshot).await?;
        }
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StateError> {
        self.tables
            .read()
            .map_err(|_| StateError::StorageError("store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StateError> {
        self.tables
            .write()
            .map_err(|_| StateError::StorageError("store lock poisoned".into()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HierarchyStore for MemoryStore {
    fn zone(&self, id: &ZoneId) -> Result<Option<Zone>, StateError> {
        Ok(self.read()?.zones.get(id).cloned())
    }

    fn dila(&self, id: &DilaId) -> Result<Option<Dila>, StateError> {
        Ok(self.read()?.dilas.get(id).cloned())
    }

    fn muqam(&self, id: &MuqamId) -> Result<Option<Muqam>, StateError> {
        Ok(self.read()?.muqams.get(id).cloned())
    }

    fn jamaat(&self, id: &JamaatId) -> Result<Option<Jamaat>, StateError> {
        Ok(self.read()?.jamaats.get(id).cloned())
    }

    fn jamaat_by_no(&self, jamaat_no: ExternalJamaatId) -> Result<Option<Jamaat>, StateError> {
        let tables = self.read()?;
        Ok(tables
            .jamaat_index
            .get(&jamaat_no)
            .and_then(|id| tables.jamaats.get(id))
            .cloned())
    }

    fn jamaats(&self) -> Result<Vec<Jamaat>, StateError> {
        let mut jamaats: Vec<Jamaat> = self.read()?.jamaats.values().cloned().collect();
        jamaats.sort_by_key(|j| j.jamaat_no);
        Ok(jamaats)
    }

    fn member_by_chanda_no(&self, chanda_no: &ChandaNo) -> Result<Option<Member>, StateError> {
        Ok(self.read()?.members.get(chanda_no).cloned())
    }

    fn members(&self) -> Result<Vec<Member>, StateError> {
        let mut members: Vec<Member> = self.read()?.members.values().cloned().collect();
        members.sort_by(|a, b| a.chanda_no.cmp(&b.chanda_no));
        Ok(members)
    }

    fn account_by_chanda_no(&self, chanda_no: &ChandaNo) -> Result<Option<Account>, StateError> {
        Ok(self.read()?.accounts.get(chanda_no).cloned())
    }

    async fn flush(&self, changes: ChangeSet) -> Result<(), StateError> {
        if changes.is_empty() {
            return Ok(());
        }

        let _guard = self.flush_lock.lock().await;
        let staged = changes.len();

        let mut next = self.read()?.clone();
        next.apply(changes)?;

        if let Some(path) = &self.snapshot_path {
            write_snapshot(path, &next.to_snapshot()).await?;
        }

        self.write()?.adopt_catalog(next);

        tracing::debug!(records = staged, "Store flushed");
        Ok(())
    }
}

/// Write a snapshot via a temporary file and rename, so readers never see
/// a partially written document.
async fn write_snapshot(path: &Path, snapshot: &StoreSnapshot) -> Result<(), StateError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let bytes = serde_json::to_vec_pretty(snapshot)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_dila_requires_zone() {
        let store = MemoryStore::new();
        let err = store.insert_dila(Dila::new("Orphan", ZoneId::generate())).unwrap_err();
        assert!(matches!(err, StateError::MissingParent { .. }));
    }

    #[tokio::test]
    async fn test_flush_rejects_duplicate_external_key() {
        let store = MemoryStore::new();
        let mut first = ChangeSet::new();
        first.stage_jamaat(Jamaat::new(ExternalJamaatId::new(1), "One"));
        store.flush(first).await.unwrap();

        // A different local row claiming the same external key.
        let mut second = ChangeSet::new();
        second.stage_jamaat(Jamaat::new(ExternalJamaatId::new(1), "Impostor"));
        let err = store.flush(second).await.unwrap_err();
        assert!(matches!(err, StateError::Conflict { .. }));
        assert_eq!(store.jamaats().unwrap().len(), 1);
        assert_eq!(store.jamaats().unwrap()[0].name, "One");
    }

    #[tokio::test]
    async fn test_failed_flush_applies_nothing() {
        let store = MemoryStore::new();
        let mut seed = ChangeSet::new();
        seed.stage_jamaat(Jamaat::new(ExternalJamaatId::new(1), "One"));
        store.flush(seed).await.unwrap();

        let mut batch = ChangeSet::new();
        batch.stage_jamaat(Jamaat::new(ExternalJamaatId::new(2), "Two"));
        batch.stage_jamaat(Jamaat::new(ExternalJamaatId::new(1), "Clash"));
        assert!(store.flush(batch).await.is_err());
        assert!(store.jamaat_by_no(ExternalJamaatId::new(2)).unwrap().is_none());
    }
}
