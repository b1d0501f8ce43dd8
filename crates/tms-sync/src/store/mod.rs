//! Metadata record storage and per-unit mutual exclusion.

mod memory;
mod sqlite;

pub use memory::MemoryMetadataStore;
pub use sqlite::SqliteMetadataStore;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::db::DatabaseError;
use crate::metadata::TranslationMetadata;
use crate::status::SourceStatus;
use crate::unit::{UnitKey, UnitKind};

/// Filter for metadata listings. Empty fields match everything.
#[derive(Debug, Default, Clone)]
pub struct MetadataFilter {
    pub kind: Option<UnitKind>,
    pub source_status: Option<SourceStatus>,
    pub job_id: Option<String>,
    pub document_id: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl MetadataFilter {
    pub fn matches(&self, meta: &TranslationMetadata) -> bool {
        self.kind.map_or(true, |k| k == meta.key.kind)
            && self.source_status.map_or(true, |s| s == meta.source_status)
            && (self.job_id.is_none() || self.job_id == meta.job_id)
            && (self.document_id.is_none() || self.document_id == meta.document_id)
    }
}

/// Key-value store of metadata records keyed by unit identity.
pub trait MetadataStore: Send + Sync {
    fn load(&self, key: &UnitKey) -> Result<Option<TranslationMetadata>, DatabaseError>;

    fn save(&self, meta: &TranslationMetadata) -> Result<(), DatabaseError>;

    /// Returns whether a record existed.
    fn delete(&self, key: &UnitKey) -> Result<bool, DatabaseError>;

    fn find_by_document_id(&self, document_id: &str) -> Result<Option<UnitKey>, DatabaseError>;

    /// Returns the matching page and the total number of matches.
    fn query(
        &self,
        filter: &MetadataFilter,
    ) -> Result<(Vec<TranslationMetadata>, u64), DatabaseError>;
}

const LOCK_PRUNE_THRESHOLD: usize = 1024;

/// One mutex per unit, created on demand. Serializes read-modify-write of
/// a single record without a global lock.
#[derive(Debug, Default)]
pub struct UnitLocks {
    locks: Mutex<HashMap<UnitKey, Arc<Mutex<()>>>>,
}

impl UnitLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lock of `key`. Hold its guard for the whole action.
    pub fn lock_for(&self, key: &UnitKey) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.len() >= LOCK_PRUNE_THRESHOLD {
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        locks.entry(key.clone()).or_default().clone()
    }

    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_key_shares_lock() {
        let locks = UnitLocks::new();
        let a = locks.lock_for(&UnitKey::content("1"));
        let b = locks.lock_for(&UnitKey::content("1"));
        let c = locks.lock_for(&UnitKey::content("2"));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(locks.len(), 2);
    }

    #[test]
    fn test_idle_locks_pruned() {
        let locks = UnitLocks::new();
        for i in 0..LOCK_PRUNE_THRESHOLD {
            locks.lock_for(&UnitKey::content(i.to_string()));
        }
        let held = locks.lock_for(&UnitKey::content("held"));
        assert_eq!(locks.len(), 1);
        drop(held);
    }

    #[test]
    fn test_filter_matches() {
        let mut meta = TranslationMetadata::new(UnitKey::content("1"), "en");
        meta.job_id = Some("spring".to_string());

        assert!(MetadataFilter::default().matches(&meta));
        let filter = MetadataFilter {
            kind: Some(UnitKind::Content),
            job_id: Some("spring".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&meta));
        let filter = MetadataFilter {
            source_status: Some(SourceStatus::Current),
            ..Default::default()
        };
        assert!(!filter.matches(&meta));
    }
}
