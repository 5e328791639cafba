//! Statement reference records
//!
//! One record per publication, mapping deposit-point id to the statement
//! IRI the repository assigned at deposit time. The original platform kept
//! this map as an opaque serialized blob on the publication settings; here
//! it is an explicit keyed type so merges are well-defined.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-publication map of deposit-point id -> statement href.
///
/// Merging is idempotent and non-destructive: setting one deposit point's
/// entry never touches entries recorded for other deposit points, and
/// re-depositing to the same point overwrites only that point's entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatementRecord {
    entries: BTreeMap<i64, String>,
}

impl StatementRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a previously stored record. Unparseable or missing data
    /// starts a fresh record rather than failing the deposit.
    pub fn from_stored(raw: Option<&str>) -> Self {
        raw.and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default()
    }

    /// Insert or overwrite the entry for one deposit point
    pub fn set(&mut self, deposit_point_id: i64, statement_href: String) {
        self.entries.insert(deposit_point_id, statement_href);
    }

    pub fn get(&self, deposit_point_id: i64) -> Option<&str> {
        self.entries.get(&deposit_point_id).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in ascending deposit-point-id order
    pub fn iter(&self) -> impl Iterator<Item = (i64, &str)> {
        self.entries.iter().map(|(id, href)| (*id, href.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_is_idempotent() {
        let mut record = StatementRecord::new();
        record.set(1, "https://repo.example.edu/statement/9".to_string());
        let before = record.clone();

        record.set(1, "https://repo.example.edu/statement/9".to_string());

        assert_eq!(record, before);
    }

    #[test]
    fn test_merge_is_non_destructive_across_points() {
        let mut record = StatementRecord::new();
        record.set(1, "https://repo-a.example.edu/statement/9".to_string());
        record.set(2, "https://repo-b.example.org/state/41".to_string());

        assert_eq!(record.len(), 2);
        assert_eq!(record.get(1), Some("https://repo-a.example.edu/statement/9"));
        assert_eq!(record.get(2), Some("https://repo-b.example.org/state/41"));
    }

    #[test]
    fn test_redeposit_overwrites_only_that_point() {
        let mut record = StatementRecord::new();
        record.set(1, "https://repo-a.example.edu/statement/9".to_string());
        record.set(2, "https://repo-b.example.org/state/41".to_string());

        record.set(2, "https://repo-b.example.org/state/42".to_string());

        assert_eq!(record.get(1), Some("https://repo-a.example.edu/statement/9"));
        assert_eq!(record.get(2), Some("https://repo-b.example.org/state/42"));
    }

    #[test]
    fn test_from_stored_none_starts_empty() {
        let record = StatementRecord::from_stored(None);
        assert!(record.is_empty());
    }

    #[test]
    fn test_from_stored_unparseable_starts_empty() {
        let record = StatementRecord::from_stored(Some("not json at all"));
        assert!(record.is_empty());
    }

    #[test]
    fn test_stored_roundtrip() {
        let mut record = StatementRecord::new();
        record.set(7, "https://repo.example.edu/statement/1".to_string());

        let raw = serde_json::to_string(&record).unwrap();
        let restored = StatementRecord::from_stored(Some(&raw));

        assert_eq!(restored, record);
    }

    #[test]
    fn test_iter_orders_by_deposit_point_id() {
        let mut record = StatementRecord::new();
        record.set(5, "e".to_string());
        record.set(1, "a".to_string());
        record.set(3, "c".to_string());

        let ids: Vec<i64> = record.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }
}
