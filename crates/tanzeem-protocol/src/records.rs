//! Record shapes returned by the external directory.
//!
//! Field names follow the directory's camelCase wire format.

use serde::{Deserialize, Serialize};

/// A Jamaat as reported by the external directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalJamaat {
    pub jamaat_id: i64,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub circuit_name: Option<String>,
}

/// A member as reported by the external directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalMember {
    pub chanda_no: String,
    #[serde(default)]
    pub jamaat_id: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub last_name: String,
    #[serde(default)]
    pub photo_url: Option<String>,
}

/// A full directory export: both collections in one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectorySnapshot {
    #[serde(default)]
    pub jamaats: Vec<ExternalJamaat>,
    #[serde(default)]
    pub members: Vec<ExternalMember>,
}
