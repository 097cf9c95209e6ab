//! Tests for the core directory types.
//!
//! Verifies:
//! - Organization level derivation from a resolved chain
//! - Mapping statistics arithmetic
//! - SyncResult bookkeeping
//! - Wire format of external records and domain events

use tanzeem_protocol::*;

// ═══════════════════════════════════════════════════════════════
// Hierarchy context
// ═══════════════════════════════════════════════════════════════

#[test]
fn empty_chain_has_no_level() {
    let ctx = HierarchyContext::from_chain(None, None, None);
    assert!(ctx.is_empty());
    assert_eq!(ctx.organization_level, None);
}

#[test]
fn muqam_only_chain_is_muqam_level() {
    let ctx = HierarchyContext::from_chain(Some(MuqamId::generate()), None, None);
    assert_eq!(ctx.organization_level, Some(OrganizationLevel::Muqam));
}

#[test]
fn truncated_chain_reports_dila_level() {
    let ctx = HierarchyContext::from_chain(
        Some(MuqamId::generate()),
        Some(DilaId::generate()),
        None,
    );
    assert_eq!(ctx.organization_level, Some(OrganizationLevel::Dila));
}

#[test]
fn organization_level_parses_case_insensitively() {
    assert_eq!("ZONE".parse::<OrganizationLevel>().unwrap(), OrganizationLevel::Zone);
    assert_eq!(" dila ".parse::<OrganizationLevel>().unwrap(), OrganizationLevel::Dila);
    assert!("jamaat".parse::<OrganizationLevel>().is_err());
}

// ═══════════════════════════════════════════════════════════════
// Mapping statistics
// ═══════════════════════════════════════════════════════════════

#[test]
fn stats_on_empty_collection_are_zero() {
    let stats = MappingStats::from_counts(0, 0);
    assert_eq!(stats.total, 0);
    assert_eq!(stats.mapped, 0);
    assert_eq!(stats.unmapped, 0);
    assert_eq!(stats.mapping_percentage, 0.0);
}

#[test]
fn stats_round_to_two_decimals() {
    let stats = MappingStats::from_counts(7, 2);
    // 2/7 = 28.5714...%
    assert_eq!(stats.mapping_percentage, 28.57);
    assert_eq!(stats.unmapped, 5);
}

#[test]
fn stats_fully_mapped_is_hundred() {
    let stats = MappingStats::from_counts(4, 4);
    assert_eq!(stats.mapping_percentage, 100.0);
}

// ═══════════════════════════════════════════════════════════════
// SyncResult
// ═══════════════════════════════════════════════════════════════

#[test]
fn sync_result_records_failures() {
    let mut result = SyncResult::new(3);
    result.new_count = 1;
    result.updated_count = 1;
    result.record_failure("Jamaat 7: name is blank".into());
    assert_eq!(result.failed_count, 1);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.processed(), 2);
    assert!(result.has_failures());
}

// ═══════════════════════════════════════════════════════════════
// Wire formats
// ═══════════════════════════════════════════════════════════════

#[test]
fn external_jamaat_reads_camel_case() {
    let json = r#"{"jamaatId": 501, "name": "Example Congregation", "circuitName": "North"}"#;
    let record: ExternalJamaat = serde_json::from_str(json).unwrap();
    assert_eq!(record.jamaat_id, 501);
    assert_eq!(record.code, None);
    assert_eq!(record.circuit_name.as_deref(), Some("North"));
}

#[test]
fn external_member_optional_fields_default() {
    let json = r#"{"chandaNo": "A-100", "firstName": "Bilal", "lastName": "Ahmad"}"#;
    let record: ExternalMember = serde_json::from_str(json).unwrap();
    assert_eq!(record.chanda_no, "A-100");
    assert!(record.jamaat_id.is_none());
    assert!(record.email.is_none());
}

#[test]
fn domain_event_is_tagged() {
    let event = DomainEvent::jamaat_mapped(JamaatId::generate(), MuqamId::generate());
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["type"], "jamaat_mapped");
    assert_eq!(event.name(), "jamaat.mapped");
}

#[test]
fn account_caches_context() {
    let ctx = HierarchyContext::from_chain(Some(MuqamId::generate()), Some(DilaId::generate()), None);
    let account = Account::new(ChandaNo::new("55".into()), None, ctx);
    assert_eq!(account.context(), ctx);
    assert_eq!(account.organization_level, Some(OrganizationLevel::Dila));
}
