//! The TanzeemConnector struct that ties everything together.
//!
//! Opens the hierarchy store and wires the resolver, mapping manager,
//! account provisioner and sync runner on top of it. The CLI commands are
//! thin wrappers around the methods here.

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use tanzeem_hierarchy::{
    AccountProvisioner, HierarchyResolver, MappingManager, MappingOutcome, MemberRef, TracingSink,
};
use tanzeem_protocol::*;
use tanzeem_state::{HierarchyStore, MemoryStore};
use tanzeem_sync::{DirectoryClient, JamaatReconciler, MemberReconciler, SyncKind};

use crate::config::ConnectorConfig;
use crate::directory::FileDirectory;
use crate::runner::SyncRunner;

pub struct TanzeemConnector {
    config: ConnectorConfig,
    store: Arc<MemoryStore>,
    resolver: HierarchyResolver,
    mapping: MappingManager,
    provisioner: AccountProvisioner,
    runner: Arc<SyncRunner>,
}

impl TanzeemConnector {
    /// Open the configured store and directory export.
    pub async fn open(config: ConnectorConfig) -> Result<Self, anyhow::Error> {
        let store = if config.store.persist {
            MemoryStore::open(&config.store.path)
                .await
                .with_context(|| format!("opening store {}", config.store.path.display()))?
        } else {
            MemoryStore::new()
        };
        let directory = Arc::new(FileDirectory::new(&config.directory.snapshot_path));
        Ok(Self::with_parts(config, Arc::new(store), directory))
    }

    /// Wire the components over an existing store and directory.
    pub fn with_parts(
        config: ConnectorConfig,
        store: Arc<MemoryStore>,
        directory: Arc<dyn DirectoryClient>,
    ) -> Self {
        let shared: Arc<dyn HierarchyStore> = store.clone();
        let sync_config = config.sync_config();
        let runner = SyncRunner::new(
            JamaatReconciler::new(directory.clone(), shared.clone(), sync_config.clone()),
            MemberReconciler::new(directory, shared.clone(), sync_config),
            config.sync.clone(),
        );

        Self {
            resolver: HierarchyResolver::new(shared.clone()),
            mapping: MappingManager::new(shared.clone(), Arc::new(TracingSink)),
            provisioner: AccountProvisioner::new(shared),
            runner: Arc::new(runner),
            store,
            config,
        }
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    pub fn mapping(&self) -> &MappingManager {
        &self.mapping
    }

    pub fn provisioner(&self) -> &AccountProvisioner {
        &self.provisioner
    }

    pub fn runner(&self) -> &Arc<SyncRunner> {
        &self.runner
    }

    /// Run a single sync of `kind` now.
    pub async fn sync(&self, kind: SyncKind, cancel: &CancellationToken) -> Result<SyncResult, anyhow::Error> {
        match self.runner.run_once(kind, cancel).await? {
            Some(result) => Ok(result),
            None => anyhow::bail!("{} sync already in progress", kind),
        }
    }

    /// Map a Jamaat, addressed by its external number, to a Muqam.
    pub async fn map(&self, jamaat_no: i64, muqam_id: MuqamId) -> Result<MappingOutcome, anyhow::Error> {
        Ok(self.mapping.map_by_no(ExternalJamaatId::new(jamaat_no), muqam_id).await?)
    }

    /// Unmap a Jamaat, returning the Muqam it was mapped to.
    pub async fn unmap(&self, jamaat_no: i64) -> Result<MuqamId, anyhow::Error> {
        Ok(self.mapping.unmap_by_no(ExternalJamaatId::new(jamaat_no)).await?)
    }

    pub fn stats(&self) -> Result<MappingStats, anyhow::Error> {
        Ok(self.mapping.stats()?)
    }

    /// Resolve the hierarchy of a synced member.
    pub fn resolve(&self, chanda_no: &ChandaNo) -> Result<HierarchyContext, anyhow::Error> {
        let member = self
            .store
            .member_by_chanda_no(chanda_no)?
            .with_context(|| format!("no member with chanda no {}", chanda_no))?;
        Ok(self.resolver.resolve(&MemberRef::from(&member)))
    }

    /// Seed a Zone and persist the store.
    pub async fn add_zone(&self, name: &str) -> Result<ZoneId, anyhow::Error> {
        let id = self.store.insert_zone(Zone::new(name))?;
        self.persist().await?;
        Ok(id)
    }

    /// Seed a Dila under an existing Zone and persist the store.
    pub async fn add_dila(&self, name: &str, zone_id: ZoneId) -> Result<DilaId, anyhow::Error> {
        let id = self.store.insert_dila(Dila::new(name, zone_id))?;
        self.persist().await?;
        Ok(id)
    }

    /// Seed a Muqam under an existing Dila and persist the store.
    pub async fn add_muqam(&self, name: &str, dila_id: DilaId) -> Result<MuqamId, anyhow::Error> {
        let id = self.store.insert_muqam(Muqam::new(name, dila_id))?;
        self.persist().await?;
        Ok(id)
    }

    async fn persist(&self) -> Result<(), anyhow::Error> {
        self.store.save().await?;
        Ok(())
    }

    /// Run the sync scheduler until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            store = %self.config.store.path.display(),
            directory = %self.config.directory.snapshot_path.display(),
            "Tanzeem connector running"
        );
        self.runner.clone().run(cancel).await;
        tracing::info!("Tanzeem connector stopped");
    }
}
