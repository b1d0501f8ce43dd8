use std::collections::HashMap;
use std::sync::RwLock;

use super::ContentRepository;
use crate::error::SyncError;
use crate::unit::{Unit, UnitKey};

/// Content repository kept in memory. Used for offline runs and tests.
#[derive(Debug, Default)]
pub struct MemoryContentRepository {
    units: RwLock<HashMap<UnitKey, Unit>>,
    translations: RwLock<HashMap<(UnitKey, String), String>>,
}

impl MemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a unit.
    pub fn insert(&self, unit: Unit) -> Result<(), SyncError> {
        let mut units = self
            .units
            .write()
            .map_err(|e| SyncError::Content(format!("Lock poisoned: {}", e)))?;
        units.insert(unit.key(), unit);
        Ok(())
    }

    pub fn remove(&self, key: &UnitKey) -> Result<Option<Unit>, SyncError> {
        let mut units = self
            .units
            .write()
            .map_err(|e| SyncError::Content(format!("Lock poisoned: {}", e)))?;
        Ok(units.remove(key))
    }

    pub fn translation(&self, key: &UnitKey, langcode: &str) -> Option<String> {
        self.translations
            .read()
            .ok()?
            .get(&(key.clone(), langcode.to_string()))
            .cloned()
    }
}

impl ContentRepository for MemoryContentRepository {
    fn load(&self, key: &UnitKey) -> Result<Option<Unit>, SyncError> {
        let units = self
            .units
            .read()
            .map_err(|e| SyncError::Content(format!("Lock poisoned: {}", e)))?;
        Ok(units.get(key).cloned())
    }

    fn save_translation(
        &self,
        key: &UnitKey,
        langcode: &str,
        content: &str,
    ) -> Result<(), SyncError> {
        let units = self
            .units
            .read()
            .map_err(|e| SyncError::Content(format!("Lock poisoned: {}", e)))?;
        if !units.contains_key(key) {
            return Err(SyncError::NotFound(key.clone()));
        }
        drop(units);

        let mut translations = self
            .translations
            .write()
            .map_err(|e| SyncError::Content(format!("Lock poisoned: {}", e)))?;
        translations.insert((key.clone(), langcode.to_string()), content.to_string());
        Ok(())
    }
}
