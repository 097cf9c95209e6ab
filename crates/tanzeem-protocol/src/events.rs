use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{JamaatId, MuqamId};

/// Notifications raised by mapping changes.
///
/// Plain immutable values: the producer collects them and hands them to an
/// event sink once the underlying write has been committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    JamaatMapped {
        jamaat_id: JamaatId,
        muqam_id: MuqamId,
        occurred_at: DateTime<Utc>,
    },
    JamaatUnmapped {
        jamaat_id: JamaatId,
        previous_muqam_id: MuqamId,
        occurred_at: DateTime<Utc>,
    },
}

impl DomainEvent {
    pub fn jamaat_mapped(jamaat_id: JamaatId, muqam_id: MuqamId) -> Self {
        DomainEvent::JamaatMapped {
            jamaat_id,
            muqam_id,
            occurred_at: Utc::now(),
        }
    }

    pub fn jamaat_unmapped(jamaat_id: JamaatId, previous_muqam_id: MuqamId) -> Self {
        DomainEvent::JamaatUnmapped {
            jamaat_id,
            previous_muqam_id,
            occurred_at: Utc::now(),
        }
    }

    /// The Jamaat this event concerns.
    pub fn jamaat_id(&self) -> JamaatId {
        match self {
            DomainEvent::JamaatMapped { jamaat_id, .. } => *jamaat_id,
            DomainEvent::JamaatUnmapped { jamaat_id, .. } => *jamaat_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::JamaatMapped { .. } => "jamaat.mapped",
            DomainEvent::JamaatUnmapped { .. } => "jamaat.unmapped",
        }
    }
}
