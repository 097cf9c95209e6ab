//! Directory client backed by a JSON export on disk.
//!
//! The file is re-read on every fetch so a fresh export is picked up by the
//! next scheduled run.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use tanzeem_protocol::{DirectorySnapshot, ExternalJamaat, ExternalMember};
use tanzeem_sync::{DirectoryClient, DirectoryError};

pub struct FileDirectory {
    path: PathBuf,
}

impl FileDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<DirectorySnapshot, DirectoryError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| DirectoryError::Unreachable(format!("{}: {}", self.path.display(), e)))?;
        let snapshot: DirectorySnapshot = serde_json::from_str(&content)
            .map_err(|e| DirectoryError::Malformed(format!("{}: {}", self.path.display(), e)))?;
        tracing::debug!(
            path = %self.path.display(),
            jamaats = snapshot.jamaats.len(),
            members = snapshot.members.len(),
            "Read directory export"
        );
        Ok(snapshot)
    }
}

#[async_trait]
impl DirectoryClient for FileDirectory {
    async fn fetch_jamaats(&self) -> Result<Vec<ExternalJamaat>, DirectoryError> {
        Ok(self.read().await?.jamaats)
    }

    async fn fetch_members(&self) -> Result<Vec<ExternalMember>, DirectoryError> {
        Ok(self.read().await?.members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_camel_case_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("directory.json");
        std::fs::write(
            &path,
            r#"{
                "jamaats": [{"jamaatId": 501, "name": "Example Congregation", "circuitName": "North"}],
                "members": [{"chandaNo": "C-1", "jamaatId": 501, "firstName": "Ahmad", "lastName": "Khan"}]
            }"#,
        )
        .unwrap();

        let directory = FileDirectory::new(&path);
        let jamaats = directory.fetch_jamaats().await.unwrap();
        assert_eq!(jamaats[0].jamaat_id, 501);
        assert_eq!(jamaats[0].circuit_name.as_deref(), Some("North"));
        let members = directory.fetch_members().await.unwrap();
        assert_eq!(members[0].jamaat_id, Some(501));
    }

    #[tokio::test]
    async fn test_missing_file_is_unreachable() {
        let dir = tempfile::tempdir().unwrap();
        let directory = FileDirectory::new(dir.path().join("absent.json"));
        let err = directory.fetch_jamaats().await.unwrap_err();
        assert!(matches!(err, DirectoryError::Unreachable(_)));
    }

    #[tokio::test]
    async fn test_garbage_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("directory.json");
        std::fs::write(&path, "not json").unwrap();
        let err = FileDirectory::new(&path).fetch_members().await.unwrap_err();
        assert!(matches!(err, DirectoryError::Malformed(_)));
    }
}
