//! Statement store backed by a JSON data file
//!
//! Persists one `StatementRecord` per publication as a single document,
//! updated atomically (temp file + rename). Merges are serialized behind
//! an internal lock so the read-modify-write cycle cannot interleave
//! within one process; concurrent batch runs from separate processes must
//! be excluded by the hosting platform.

use crate::core::error::DepositError;
use crate::core::statement::StatementRecord;
use crate::core::traits::StatementStore;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Data file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreData {
    version: String,
    last_updated: String,
    publications: BTreeMap<i64, StatementRecord>,
}

impl Default for StoreData {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            last_updated: String::new(),
            publications: BTreeMap::new(),
        }
    }
}

/// JSON-file-backed statement store
pub struct JsonStatementStore {
    data_file_path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStatementStore {
    /// Create a store over the given data file. The file is created on
    /// first merge; a missing file is an empty store.
    pub fn new<P: Into<PathBuf>>(data_file_path: P) -> Self {
        Self {
            data_file_path: data_file_path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Load current store contents. Missing or unparseable data starts
    /// empty rather than blocking deposits; a parse problem is logged.
    async fn load(&self) -> StoreData {
        let raw = match fs::read_to_string(&self.data_file_path).await {
            Ok(raw) => raw,
            Err(_) => return StoreData::default(),
        };

        match serde_json::from_str(&raw) {
            Ok(data) => data,
            Err(e) => {
                warn!(
                    path = %self.data_file_path.display(),
                    error = %e,
                    "statement store unparseable, starting empty"
                );
                StoreData::default()
            }
        }
    }

    /// Write the whole document as one atomic update
    async fn save(&self, data: &StoreData) -> Result<(), DepositError> {
        let json = serde_json::to_string_pretty(data).map_err(|e| DepositError::Store {
            message: format!("failed to encode statement store: {}", e),
        })?;

        if let Some(parent) = self.data_file_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.map_err(|e| DepositError::Store {
                message: format!("failed to create {}: {}", parent.display(), e),
            })?;
        }

        let temp_path = self.data_file_path.with_extension("json.tmp");
        fs::write(&temp_path, json).await.map_err(|e| DepositError::Store {
            message: format!("failed to write {}: {}", temp_path.display(), e),
        })?;
        fs::rename(&temp_path, &self.data_file_path)
            .await
            .map_err(|e| DepositError::Store {
                message: format!("failed to replace {}: {}", self.data_file_path.display(), e),
            })?;

        Ok(())
    }
}

#[async_trait]
impl StatementStore for JsonStatementStore {
    async fn merge(
        &self,
        publication_id: i64,
        deposit_point_id: i64,
        statement_href: &str,
    ) -> Result<(), DepositError> {
        let _guard = self.write_lock.lock().await;

        let mut data = self.load().await;
        data.publications
            .entry(publication_id)
            .or_default()
            .set(deposit_point_id, statement_href.to_string());
        data.last_updated = Utc::now().to_rfc3339();

        self.save(&data).await?;

        debug!(
            publication_id,
            deposit_point_id, "statement reference recorded"
        );

        Ok(())
    }

    async fn record(&self, publication_id: i64) -> Result<StatementRecord, DepositError> {
        let data = self.load().await;

        Ok(data
            .publications
            .get(&publication_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> JsonStatementStore {
        JsonStatementStore::new(dir.path().join("statements.json"))
    }

    #[tokio::test]
    async fn test_merge_creates_data_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store
            .merge(12, 1, "https://repo.example.edu/statement/9")
            .await
            .unwrap();

        assert!(dir.path().join("statements.json").exists());
        let record = store.record(12).await.unwrap();
        assert_eq!(record.get(1), Some("https://repo.example.edu/statement/9"));
    }

    #[tokio::test]
    async fn test_merge_is_non_destructive_across_points() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.merge(12, 1, "https://repo-a.example.edu/st/1").await.unwrap();
        store.merge(12, 2, "https://repo-b.example.org/st/2").await.unwrap();

        let record = store.record(12).await.unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(record.get(1), Some("https://repo-a.example.edu/st/1"));
        assert_eq!(record.get(2), Some("https://repo-b.example.org/st/2"));
    }

    #[tokio::test]
    async fn test_merge_same_pair_twice_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.merge(12, 1, "https://repo.example.edu/st/1").await.unwrap();
        let before = store.record(12).await.unwrap();

        store.merge(12, 1, "https://repo.example.edu/st/1").await.unwrap();
        let after = store.record(12).await.unwrap();

        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_redeposit_overwrites_only_that_point() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.merge(12, 1, "https://repo-a.example.edu/st/1").await.unwrap();
        store.merge(12, 2, "https://repo-b.example.org/st/2").await.unwrap();
        store.merge(12, 2, "https://repo-b.example.org/st/3").await.unwrap();

        let record = store.record(12).await.unwrap();
        assert_eq!(record.get(1), Some("https://repo-a.example.edu/st/1"));
        assert_eq!(record.get(2), Some("https://repo-b.example.org/st/3"));
    }

    #[tokio::test]
    async fn test_records_are_separate_per_publication() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.merge(12, 1, "https://repo.example.edu/st/12").await.unwrap();
        store.merge(13, 1, "https://repo.example.edu/st/13").await.unwrap();

        assert_eq!(
            store.record(12).await.unwrap().get(1),
            Some("https://repo.example.edu/st/12")
        );
        assert_eq!(
            store.record(13).await.unwrap().get(1),
            Some("https://repo.example.edu/st/13")
        );
    }

    #[tokio::test]
    async fn test_unknown_publication_yields_empty_record() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let record = store.record(999).await.unwrap();

        assert!(record.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_data_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("statements.json");
        fs::write(&path, "{ not json").await.unwrap();

        let store = JsonStatementStore::new(&path);
        assert!(store.record(12).await.unwrap().is_empty());

        // merging over the corrupt file replaces it with a valid document
        store.merge(12, 1, "https://repo.example.edu/st/1").await.unwrap();
        let record = store.record(12).await.unwrap();
        assert_eq!(record.get(1), Some("https://repo.example.edu/st/1"));
    }
}
