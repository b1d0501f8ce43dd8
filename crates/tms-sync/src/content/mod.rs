//! Access to the CMS that owns the translatable units.

mod memory;

pub use memory::MemoryContentRepository;

use crate::error::SyncError;
use crate::unit::{Unit, UnitKey};

pub trait ContentRepository: Send + Sync {
    /// Loads a unit, `None` when the CMS has no such unit.
    fn load(&self, key: &UnitKey) -> Result<Option<Unit>, SyncError>;

    /// Stores a downloaded translation as the unit's `langcode` variant.
    fn save_translation(&self, key: &UnitKey, langcode: &str, content: &str)
        -> Result<(), SyncError>;
}
