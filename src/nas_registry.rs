//! NAS registry
//!
//! Lookup of known access points. The shared secret never leaves this module.

use std::sync::Arc;

use log::debug;
use serde::Serialize;

use crate::error_handling::types::StorageError;
use crate::storage::storage_trait::NasDirectory;
use crate::storage::types::NasRecord;

/// Outward-facing view of a NAS row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NasInfo {
    pub id: i32,
    pub nasname: String,
    pub shortname: Option<String>,
    #[serde(rename = "type")]
    pub nas_type: Option<String>,
    pub description: Option<String>,
}

impl From<NasRecord> for NasInfo {
    fn from(record: NasRecord) -> Self {
        Self {
            id: record.id,
            nasname: record.name,
            shortname: record.short_name,
            nas_type: record.nas_type,
            description: record.description,
        }
    }
}

#[derive(Clone)]
pub struct NasRegistry {
    directory: Arc<dyn NasDirectory>,
}

impl NasRegistry {
    pub fn new(directory: Arc<dyn NasDirectory>) -> Self {
        Self { directory }
    }

    /// First NAS registered under `address`, if any.
    pub async fn lookup(&self, address: &str) -> Result<Option<NasInfo>, StorageError> {
        let found = self.directory.get_nas(Some(address)).await?;
        debug!("NAS lookup for {}: {} match(es)", address, found.len());
        Ok(found.into_iter().next().map(NasInfo::from))
    }

    pub async fn list(&self) -> Result<Vec<NasInfo>, StorageError> {
        self.list_filtered(None).await
    }

    pub async fn list_filtered(&self, name: Option<&str>) -> Result<Vec<NasInfo>, StorageError> {
        let rows = self.directory.get_nas(name).await?;
        Ok(rows.into_iter().map(NasInfo::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::{seed_nas, temp_storage};

    #[tokio::test]
    async fn test_lookup_and_list() {
        let storage = temp_storage().await;
        seed_nas(&storage, "10.0.0.1", "ap-lobby", "s3cret").await;
        seed_nas(&storage, "10.0.0.2", "ap-roof", "s3cret2").await;
        let registry = NasRegistry::new(storage.clone());

        let lobby = registry.lookup("10.0.0.1").await.unwrap().unwrap();
        assert_eq!(lobby.shortname.as_deref(), Some("ap-lobby"));
        assert!(registry.lookup("10.9.9.9").await.unwrap().is_none());

        assert_eq!(registry.list().await.unwrap().len(), 2);
        let roof = registry.list_filtered(Some("10.0.0.2")).await.unwrap();
        assert_eq!(roof.len(), 1);
        assert_eq!(roof[0].nasname, "10.0.0.2");
    }

    #[tokio::test]
    async fn test_secret_is_never_serialized() {
        let storage = temp_storage().await;
        seed_nas(&storage, "10.0.0.1", "ap-lobby", "s3cret").await;
        let registry = NasRegistry::new(storage.clone());

        let json = serde_json::to_string(&registry.list().await.unwrap()).unwrap();
        assert!(!json.contains("s3cret"));
        assert!(!json.contains("secret"));
        assert!(json.contains("\"type\":\"other\""));
    }
}
