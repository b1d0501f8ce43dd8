use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{MetadataFilter, MetadataStore};
use crate::db::DatabaseError;
use crate::metadata::TranslationMetadata;
use crate::unit::UnitKey;

/// Metadata store kept in memory.
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    records: RwLock<BTreeMap<UnitKey, TranslationMetadata>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetadataStore for MemoryMetadataStore {
    fn load(&self, key: &UnitKey) -> Result<Option<TranslationMetadata>, DatabaseError> {
        let records = self.records.read().map_err(|_| DatabaseError::LockPoisoned)?;
        Ok(records.get(key).cloned())
    }

    fn save(&self, meta: &TranslationMetadata) -> Result<(), DatabaseError> {
        let mut records = self.records.write().map_err(|_| DatabaseError::LockPoisoned)?;
        records.insert(meta.key.clone(), meta.clone());
        Ok(())
    }

    fn delete(&self, key: &UnitKey) -> Result<bool, DatabaseError> {
        let mut records = self.records.write().map_err(|_| DatabaseError::LockPoisoned)?;
        Ok(records.remove(key).is_some())
    }

    fn find_by_document_id(&self, document_id: &str) -> Result<Option<UnitKey>, DatabaseError> {
        let records = self.records.read().map_err(|_| DatabaseError::LockPoisoned)?;
        Ok(records
            .values()
            .find(|m| m.document_id.as_deref() == Some(document_id))
            .map(|m| m.key.clone()))
    }

    fn query(
        &self,
        filter: &MetadataFilter,
    ) -> Result<(Vec<TranslationMetadata>, u64), DatabaseError> {
        let records = self.records.read().map_err(|_| DatabaseError::LockPoisoned)?;
        let matching: Vec<&TranslationMetadata> =
            records.values().filter(|m| filter.matches(m)).collect();
        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(filter.offset.unwrap_or(0) as usize)
            .take(filter.limit.unwrap_or(100) as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }
}
