use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProtocolError;

/// Declares a UUID-backed identifier for one entity collection.
///
/// Each collection gets its own type so a `MuqamId` can never be passed
/// where a `DilaId` is expected.
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new(id: Uuid) -> Self {
                Self(id)
            }

            /// Generate a fresh random identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub const fn kind() -> &'static str {
                $kind
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ProtocolError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| ProtocolError::InvalidId {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

entity_id!(
    /// Identifier of a top-level Zone.
    ZoneId,
    "Zone"
);
entity_id!(
    /// Identifier of a Dila (district).
    DilaId,
    "Dila"
);
entity_id!(
    /// Identifier of a Muqam (local administrative unit).
    MuqamId,
    "Muqam"
);
entity_id!(
    /// Local identifier of a Jamaat row.
    JamaatId,
    "Jamaat"
);
entity_id!(MemberId, "Member");
entity_id!(AccountId, "Account");

/// Numeric Jamaat key assigned by the external directory.
///
/// This is the natural key used to match feed records against local rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalJamaatId(pub i64);

impl ExternalJamaatId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ExternalJamaatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A member's membership number. Unique and immutable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChandaNo(pub String);

impl ChandaNo {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Parse a membership number, trimming surrounding whitespace.
    ///
    /// Blank values are rejected since they cannot act as a join key.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ProtocolError::InvalidChandaNo(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChandaNo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
