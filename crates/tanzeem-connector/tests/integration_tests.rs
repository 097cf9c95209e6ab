//! Integration tests for the Tanzeem connector.
//!
//! These tests compose every crate against files on disk:
//! - Directory export -> sync -> persisted store -> reopen
//! - Map -> resolve -> provision -> remap -> refresh
//! - Scheduler exclusion and shutdown

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use tanzeem_connector::{ConnectorConfig, SyncRunner, TanzeemConnector};
use tanzeem_protocol::*;
use tanzeem_state::{HierarchyStore, MemoryStore};
use tanzeem_sync::{
    DirectoryClient, DirectoryError, JamaatReconciler, MemberReconciler, SyncConfig, SyncKind,
};

fn write_export(path: &Path) {
    let export = DirectorySnapshot {
        jamaats: vec![
            ExternalJamaat {
                jamaat_id: 501,
                name: "Example Congregation".into(),
                code: Some("EC".into()),
                circuit_name: Some("North".into()),
            },
            ExternalJamaat {
                jamaat_id: 502,
                name: "Second Congregation".into(),
                code: None,
                circuit_name: None,
            },
        ],
        members: vec![ExternalMember {
            chanda_no: "C-100".into(),
            jamaat_id: Some(501),
            email: Some("member@example.org".into()),
            first_name: "Bilal".into(),
            middle_name: None,
            last_name: "Ahmad".into(),
            photo_url: None,
        }],
    };
    std::fs::write(path, serde_json::to_string_pretty(&export).unwrap()).unwrap();
}

fn config_in(dir: &Path) -> ConnectorConfig {
    let mut config = ConnectorConfig::default();
    config.store.path = dir.join("store.json");
    config.directory.snapshot_path = dir.join("directory.json");
    config
}

// ═══════════════════════════════════════════════════════════════
// End-to-End: Sync and Persistence
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn e2e_sync_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    write_export(&dir.path().join("directory.json"));
    let config = config_in(dir.path());

    let connector = TanzeemConnector::open(config.clone()).await.unwrap();
    let cancel = CancellationToken::new();
    let jamaats = connector.sync(SyncKind::Jamaats, &cancel).await.unwrap();
    assert_eq!((jamaats.total_fetched, jamaats.new_count), (2, 2));
    let members = connector.sync(SyncKind::Members, &cancel).await.unwrap();
    assert_eq!(members.new_count, 1);

    // A second run over the same export only updates.
    let again = connector.sync(SyncKind::Jamaats, &cancel).await.unwrap();
    assert_eq!((again.new_count, again.updated_count), (0, 2));

    let reopened = TanzeemConnector::open(config).await.unwrap();
    let store = reopened.store();
    assert_eq!(store.jamaats().unwrap().len(), 2);
    let jamaat = store.jamaat_by_no(ExternalJamaatId::new(501)).unwrap().unwrap();
    assert_eq!(jamaat.circuit_name.as_deref(), Some("North"));
    assert_eq!(jamaat.muqam_id, None);
}

#[tokio::test]
async fn e2e_missing_export_is_transport_failure() {
    let dir = tempfile::tempdir().unwrap();
    let connector = TanzeemConnector::open(config_in(dir.path())).await.unwrap();
    let err = connector
        .sync(SyncKind::Jamaats, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Directory"));
    assert!(!dir.path().join("store.json").exists());
}

// ═══════════════════════════════════════════════════════════════
// End-to-End: Mapping and Accounts
// ═══════════════════════════════════════════════════════════════

#[tokio::test]
async fn e2e_map_resolve_provision_refresh() {
    let dir = tempfile::tempdir().unwrap();
    write_export(&dir.path().join("directory.json"));
    let config = config_in(dir.path());
    let connector = TanzeemConnector::open(config.clone()).await.unwrap();
    let cancel = CancellationToken::new();
    connector.sync(SyncKind::Jamaats, &cancel).await.unwrap();
    connector.sync(SyncKind::Members, &cancel).await.unwrap();

    let zone = connector.add_zone("Punjab").await.unwrap();
    let dila = connector.add_dila("Lahore", zone).await.unwrap();
    let first = connector.add_muqam("Model Town", dila).await.unwrap();
    let second = connector.add_muqam("Garden Town", dila).await.unwrap();

    connector.map(501, first).await.unwrap();
    let stats = connector.stats().unwrap();
    assert_eq!((stats.total, stats.mapped), (2, 1));
    assert_eq!(stats.mapping_percentage, 50.0);

    let chanda_no = ChandaNo::new("C-100".into());
    let ctx = connector.resolve(&chanda_no).unwrap();
    assert_eq!(ctx.muqam_id, Some(first));
    assert_eq!(ctx.dila_id, Some(dila));
    assert_eq!(ctx.organization_level, Some(OrganizationLevel::Zone));

    let account = connector.provisioner().provision(&chanda_no, None).await.unwrap();
    assert_eq!(account.muqam_id, Some(first));

    connector.map(501, second).await.unwrap();
    let refreshed = connector.provisioner().refresh(&chanda_no).await.unwrap();
    assert_eq!(refreshed.muqam_id, Some(second));

    // Seeded tiers, mapping and account all survive a restart.
    let reopened = TanzeemConnector::open(config).await.unwrap();
    assert_eq!(reopened.resolve(&chanda_no).unwrap().muqam_id, Some(second));
    let stored = reopened.store().account_by_chanda_no(&chanda_no).unwrap().unwrap();
    assert_eq!(stored.muqam_id, Some(second));
}

#[tokio::test]
async fn e2e_unmap_then_unmap_again_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_export(&dir.path().join("directory.json"));
    let connector = TanzeemConnector::open(config_in(dir.path())).await.unwrap();
    connector.sync(SyncKind::Jamaats, &CancellationToken::new()).await.unwrap();

    let zone = connector.add_zone("Zone").await.unwrap();
    let dila = connector.add_dila("Dila", zone).await.unwrap();
    let muqam = connector.add_muqam("Muqam", dila).await.unwrap();
    connector.map(502, muqam).await.unwrap();

    assert_eq!(connector.unmap(502).await.unwrap(), muqam);
    assert!(connector.unmap(502).await.is_err());
}

// ═══════════════════════════════════════════════════════════════
// Scheduler
// ═══════════════════════════════════════════════════════════════

/// Serves one Jamaat and one Member after a fixed delay.
struct SlowDirectory(Duration);

#[async_trait]
impl DirectoryClient for SlowDirectory {
    async fn fetch_jamaats(&self) -> Result<Vec<ExternalJamaat>, DirectoryError> {
        tokio::time::sleep(self.0).await;
        Ok(vec![ExternalJamaat {
            jamaat_id: 1,
            name: "Slow".into(),
            code: None,
            circuit_name: None,
        }])
    }

    async fn fetch_members(&self) -> Result<Vec<ExternalMember>, DirectoryError> {
        tokio::time::sleep(self.0).await;
        Ok(vec![ExternalMember {
            chanda_no: "S-1".into(),
            jamaat_id: Some(1),
            email: None,
            first_name: "Slow".into(),
            middle_name: None,
            last_name: "Member".into(),
            photo_url: None,
        }])
    }
}

fn slow_runner(store: Arc<MemoryStore>, delay: Duration) -> Arc<SyncRunner> {
    let directory: Arc<dyn DirectoryClient> = Arc::new(SlowDirectory(delay));
    let shared: Arc<dyn HierarchyStore> = store;
    let mut schedule = ConnectorConfig::default().sync;
    schedule.jamaat_interval_secs = 3600;
    schedule.member_interval_secs = 3600;
    Arc::new(SyncRunner::new(
        JamaatReconciler::new(directory.clone(), shared.clone(), SyncConfig::default()),
        MemberReconciler::new(directory, shared, SyncConfig::default()),
        schedule,
    ))
}

#[tokio::test]
async fn overlapping_run_of_same_kind_is_skipped() {
    let store = Arc::new(MemoryStore::new());
    let runner = slow_runner(store.clone(), Duration::from_millis(200));
    let cancel = CancellationToken::new();

    let (first, second, members) = tokio::join!(
        runner.run_once(SyncKind::Jamaats, &cancel),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            runner.run_once(SyncKind::Jamaats, &cancel).await
        },
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            runner.run_once(SyncKind::Members, &cancel).await
        },
    );

    assert_eq!(first.unwrap().unwrap().new_count, 1);
    assert!(second.unwrap().is_none());
    // Different kinds are not excluded from each other.
    assert_eq!(members.unwrap().unwrap().new_count, 1);
}

#[tokio::test]
async fn scheduler_runs_on_start_and_stops_on_cancel() {
    let store = Arc::new(MemoryStore::new());
    let runner = slow_runner(store.clone(), Duration::from_millis(10));
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(runner.run(cancel.clone()));

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while store.jamaats().unwrap().is_empty() || store.members().unwrap().is_empty() {
        assert!(tokio::time::Instant::now() < deadline, "scheduled syncs never ran");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("scheduler did not stop")
        .unwrap();
}
