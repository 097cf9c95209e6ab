//! Tests for account provisioning.

use std::sync::Arc;

use tanzeem_hierarchy::{AccountProvisioner, HierarchyError, MappingManager, MemberRef, TracingSink};
use tanzeem_protocol::*;
use tanzeem_state::{ChangeSet, HierarchyStore, MemoryStore};

async fn store_with_member() -> (Arc<MemoryStore>, MuqamId, MuqamId, ZoneId) {
    let store = MemoryStore::new();
    let zone = store.insert_zone(Zone::new("Sindh")).unwrap();
    let dila = store.insert_dila(Dila::new("Karachi", zone)).unwrap();
    let m1 = store.insert_muqam(Muqam::new("Saddar", dila)).unwrap();
    let m2 = store.insert_muqam(Muqam::new("Clifton", dila)).unwrap();

    let mut jamaat = Jamaat::new(ExternalJamaatId::new(31), "Saddar Jamaat");
    jamaat.muqam_id = Some(m1);
    let mut member = Member::new(ChandaNo::new("C-31".into()), "Hamid", "Shah");
    member.jamaat_no = Some(ExternalJamaatId::new(31));
    member.email = Some("hamid@example.org".into());

    let mut changes = ChangeSet::new();
    changes.stage_jamaat(jamaat);
    changes.stage_member(member);
    store.flush(changes).await.unwrap();
    (Arc::new(store), m1, m2, zone)
}

#[tokio::test]
async fn provision_caches_resolved_context() {
    let (store, m1, _, zone) = store_with_member().await;
    let provisioner = AccountProvisioner::new(store.clone());

    let chanda_no = ChandaNo::new("C-31".into());
    let account = provisioner.provision(&chanda_no, None).await.unwrap();
    assert_eq!(account.muqam_id, Some(m1));
    assert_eq!(account.zone_id, Some(zone));
    assert_eq!(account.organization_level, Some(OrganizationLevel::Zone));
    assert_eq!(account.email.as_deref(), Some("hamid@example.org"));
    assert!(store.account_by_chanda_no(&chanda_no).unwrap().is_some());
}

#[tokio::test]
async fn provision_twice_is_invalid_state() {
    let (store, ..) = store_with_member().await;
    let provisioner = AccountProvisioner::new(store);
    let chanda_no = ChandaNo::new("C-31".into());

    provisioner.provision(&chanda_no, None).await.unwrap();
    let err = provisioner.provision(&chanda_no, None).await.unwrap_err();
    assert!(matches!(err, HierarchyError::InvalidState(_)));
}

#[tokio::test]
async fn provision_unknown_member_is_not_found() {
    let (store, ..) = store_with_member().await;
    let provisioner = AccountProvisioner::new(store);
    let err = provisioner
        .provision(&ChandaNo::new("missing".into()), Some("x@example.org".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, HierarchyError::NotFound { kind: "Member", .. }));
}

#[tokio::test]
async fn refresh_follows_remap() {
    let (store, _, m2, _) = store_with_member().await;
    let provisioner = AccountProvisioner::new(store.clone());
    let manager = MappingManager::new(store.clone(), Arc::new(TracingSink));
    let chanda_no = ChandaNo::new("C-31".into());

    provisioner.provision(&chanda_no, None).await.unwrap();
    manager
        .map_by_no(ExternalJamaatId::new(31), m2)
        .await
        .unwrap();

    let refreshed = provisioner.refresh(&chanda_no).await.unwrap();
    assert_eq!(refreshed.muqam_id, Some(m2));
    let stored = store.account_by_chanda_no(&chanda_no).unwrap().unwrap();
    assert_eq!(stored.muqam_id, Some(m2));
}

#[tokio::test]
async fn preview_without_links_has_no_level() {
    let (store, ..) = store_with_member().await;
    let provisioner = AccountProvisioner::new(store);
    let ctx = provisioner.preview(&MemberRef::default());
    assert_eq!(ctx.organization_level, None);
}
