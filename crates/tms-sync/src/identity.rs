//! Maps between local units and their remote documents and locales.

use std::sync::Arc;

use crate::content::ContentRepository;
use crate::error::SyncError;
use crate::locale::LocaleMapper;
use crate::metadata::TranslationMetadata;
use crate::store::MetadataStore;
use crate::unit::{Unit, UnitKey};

/// The remote side of an uploaded unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub document_id: String,
    pub source_locale: String,
}

pub struct IdentityMapper {
    content: Arc<dyn ContentRepository>,
    store: Arc<dyn MetadataStore>,
    locales: LocaleMapper,
}

impl IdentityMapper {
    pub fn new(
        content: Arc<dyn ContentRepository>,
        store: Arc<dyn MetadataStore>,
        locales: LocaleMapper,
    ) -> Self {
        Self {
            content,
            store,
            locales,
        }
    }

    pub fn resolve_unit(&self, key: &UnitKey) -> Result<Unit, SyncError> {
        self.content
            .load(key)?
            .ok_or_else(|| SyncError::NotFound(key.clone()))
    }

    /// `None` until the unit has been uploaded.
    pub fn document_of(&self, meta: &TranslationMetadata) -> Result<Option<DocumentRef>, SyncError> {
        let Some(document_id) = &meta.document_id else {
            return Ok(None);
        };
        Ok(Some(DocumentRef {
            document_id: document_id.clone(),
            source_locale: self.to_remote(&meta.source_langcode)?.to_string(),
        }))
    }

    /// Reverse lookup of the unit owning a remote document.
    pub fn unit_for_document(&self, document_id: &str) -> Result<Option<UnitKey>, SyncError> {
        Ok(self.store.find_by_document_id(document_id)?)
    }

    pub fn to_remote(&self, langcode: &str) -> Result<&str, SyncError> {
        self.locales.to_remote(langcode)
    }

    pub fn to_langcode(&self, locale: &str) -> Result<&str, SyncError> {
        self.locales.to_langcode(locale)
    }

    pub fn locales(&self) -> &LocaleMapper {
        &self.locales
    }
}
