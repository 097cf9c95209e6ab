use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::MAPPING_PERCENTAGE_DECIMALS;
use crate::error::ProtocolError;
use crate::identity::*;

/// Top-level region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
}

impl Zone {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ZoneId::generate(),
            name: name.into(),
        }
    }
}

/// District within a Zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dila {
    pub id: DilaId,
    pub name: String,
    pub zone_id: ZoneId,
}

impl Dila {
    pub fn new(name: impl Into<String>, zone_id: ZoneId) -> Self {
        Self {
            id: DilaId::generate(),
            name: name.into(),
            zone_id,
        }
    }
}

/// Local administrative unit within a Dila.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Muqam {
    pub id: MuqamId,
    pub name: String,
    pub dila_id: DilaId,
}

impl Muqam {
    pub fn new(name: impl Into<String>, dila_id: DilaId) -> Self {
        Self {
            id: MuqamId::generate(),
            name: name.into(),
            dila_id,
        }
    }
}

/// A local congregation sourced from the external directory.
///
/// `jamaat_no` is the external natural key. `muqam_id` is owned locally
/// and only ever changed through the mapping operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jamaat {
    pub id: JamaatId,
    pub jamaat_no: ExternalJamaatId,
    pub name: String,
    pub code: Option<String>,
    pub circuit_name: Option<String>,
    pub muqam_id: Option<MuqamId>,
    pub created_on: DateTime<Utc>,
    pub updated_on: Option<DateTime<Utc>>,
    /// Row version for optimistic concurrency; bumped by every committed write.
    #[serde(default)]
    pub version: u64,
}

impl Jamaat {
    /// Create an unmapped Jamaat for the given external key.
    pub fn new(jamaat_no: ExternalJamaatId, name: impl Into<String>) -> Self {
        Self {
            id: JamaatId::generate(),
            jamaat_no,
            name: name.into(),
            code: None,
            circuit_name: None,
            muqam_id: None,
            created_on: Utc::now(),
            updated_on: None,
            version: 0,
        }
    }

    pub fn is_mapped(&self) -> bool {
        self.muqam_id.is_some()
    }
}

/// A person record sourced from the external directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub chanda_no: ChandaNo,
    /// Direct link to the member's Jamaat by its external key.
    pub jamaat_no: Option<ExternalJamaatId>,
    /// Direct Muqam link, used when the Jamaat is not yet known.
    pub muqam_id: Option<MuqamId>,
    pub email: Option<String>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub photo_url: Option<String>,
    pub created_on: DateTime<Utc>,
    pub updated_on: Option<DateTime<Utc>>,
}

impl Member {
    pub fn new(chanda_no: ChandaNo, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: MemberId::generate(),
            chanda_no,
            jamaat_no: None,
            muqam_id: None,
            email: None,
            first_name: first_name.into(),
            middle_name: None,
            last_name: last_name.into(),
            photo_url: None,
            created_on: Utc::now(),
            updated_on: None,
        }
    }

    /// Display name assembled from the name parts.
    pub fn full_name(&self) -> String {
        [Some(self.first_name.as_str()), self.middle_name.as_deref(), Some(self.last_name.as_str())]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Coarsest hierarchy tier reachable for a member or account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrganizationLevel {
    Zone,
    Dila,
    Muqam,
}

impl OrganizationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationLevel::Zone => "Zone",
            OrganizationLevel::Dila => "Dila",
            OrganizationLevel::Muqam => "Muqam",
        }
    }
}

impl std::fmt::Display for OrganizationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrganizationLevel {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zone" => Ok(OrganizationLevel::Zone),
            "dila" => Ok(OrganizationLevel::Dila),
            "muqam" => Ok(OrganizationLevel::Muqam),
            other => Err(ProtocolError::UnknownLevel(other.to_string())),
        }
    }
}

/// Resolved ancestor chain for a member or account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyContext {
    pub muqam_id: Option<MuqamId>,
    pub dila_id: Option<DilaId>,
    pub zone_id: Option<ZoneId>,
    pub organization_level: Option<OrganizationLevel>,
}

impl HierarchyContext {
    /// Build a context from the resolved ids, deriving the level.
    ///
    /// The level is the coarsest id present: Zone, then Dila, then Muqam.
    pub fn from_chain(
        muqam_id: Option<MuqamId>,
        dila_id: Option<DilaId>,
        zone_id: Option<ZoneId>,
    ) -> Self {
        let organization_level = if zone_id.is_some() {
            Some(OrganizationLevel::Zone)
        } else if dila_id.is_some() {
            Some(OrganizationLevel::Dila)
        } else if muqam_id.is_some() {
            Some(OrganizationLevel::Muqam)
        } else {
            None
        };
        Self {
            muqam_id,
            dila_id,
            zone_id,
            organization_level,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.muqam_id.is_none() && self.dila_id.is_none() && self.zone_id.is_none()
    }
}

/// A locally provisioned user account keyed by ChandaNo.
///
/// The hierarchy fields are a denormalized cache of the resolved context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub chanda_no: ChandaNo,
    pub email: Option<String>,
    pub muqam_id: Option<MuqamId>,
    pub dila_id: Option<DilaId>,
    pub zone_id: Option<ZoneId>,
    pub organization_level: Option<OrganizationLevel>,
    pub created_on: DateTime<Utc>,
}

impl Account {
    pub fn new(chanda_no: ChandaNo, email: Option<String>, context: HierarchyContext) -> Self {
        let mut account = Self {
            id: AccountId::generate(),
            chanda_no,
            email,
            muqam_id: None,
            dila_id: None,
            zone_id: None,
            organization_level: None,
            created_on: Utc::now(),
        };
        account.apply_context(&context);
        account
    }

    /// Overwrite the cached hierarchy fields.
    pub fn apply_context(&mut self, context: &HierarchyContext) {
        self.muqam_id = context.muqam_id;
        self.dila_id = context.dila_id;
        self.zone_id = context.zone_id;
        self.organization_level = context.organization_level;
    }

    pub fn context(&self) -> HierarchyContext {
        HierarchyContext {
            muqam_id: self.muqam_id,
            dila_id: self.dila_id,
            zone_id: self.zone_id,
            organization_level: self.organization_level,
        }
    }
}

/// Aggregate Jamaat mapping coverage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MappingStats {
    pub total: u64,
    pub mapped: u64,
    pub unmapped: u64,
    pub mapping_percentage: f64,
}

impl MappingStats {
    /// Compute stats from raw counts. An empty collection reports 0%.
    pub fn from_counts(total: u64, mapped: u64) -> Self {
        let mapping_percentage = if total == 0 {
            0.0
        } else {
            round_to(mapped as f64 / total as f64 * 100.0, MAPPING_PERCENTAGE_DECIMALS)
        };
        Self {
            total,
            mapped,
            unmapped: total.saturating_sub(mapped),
            mapping_percentage,
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Outcome of one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub total_fetched: usize,
    pub new_count: usize,
    pub updated_count: usize,
    pub failed_count: usize,
    pub errors: Vec<String>,
}

impl SyncResult {
    pub fn new(total_fetched: usize) -> Self {
        Self {
            total_fetched,
            ..Default::default()
        }
    }

    /// Record a failed item with its formatted error string.
    pub fn record_failure(&mut self, message: String) {
        self.failed_count += 1;
        self.errors.push(message);
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count > 0
    }

    /// Number of records that were created or updated.
    pub fn processed(&self) -> usize {
        self.new_count + self.updated_count
    }
}
