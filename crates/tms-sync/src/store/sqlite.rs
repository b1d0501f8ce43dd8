use chrono::{DateTime, Utc};

use super::{MetadataFilter, MetadataStore};
use crate::config::EngineConfig;
use crate::db::metadata_repo::{self, MetadataRow, MetadataRowFilter, TargetRow};
use crate::db::{Database, DatabaseError};
use crate::metadata::TranslationMetadata;
use crate::status::{SourceStatus, TargetStatus};
use crate::unit::{UnitKey, UnitKind};

fn parse_source_status(s: &str, key: &UnitKey) -> SourceStatus {
    SourceStatus::parse(s).unwrap_or_else(|| {
        log::warn!(
            "Unknown source status '{}' for {}, defaulting to UNTRACKED",
            s,
            key
        );
        SourceStatus::Untracked
    })
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            log::warn!("parse_timestamp: failed to parse '{}': {}", s, e);
            Utc::now()
        })
}

fn to_metadata(row: MetadataRow, targets: Vec<TargetRow>) -> Option<TranslationMetadata> {
    let Some(kind) = UnitKind::parse(&row.unit_kind) else {
        log::warn!(
            "Skipping metadata row with unknown unit kind '{}'",
            row.unit_kind
        );
        return None;
    };
    let key = UnitKey::new(kind, row.local_id);

    let target_status = targets
        .into_iter()
        .filter_map(|t| match TargetStatus::parse(&t.status) {
            Some(status) => Some((t.langcode, status)),
            None => {
                log::warn!(
                    "Dropping unknown target status '{}' for {} ({})",
                    t.status,
                    key,
                    t.langcode
                );
                None
            }
        })
        .collect();

    Some(TranslationMetadata {
        source_status: parse_source_status(&row.source_status, &key),
        key,
        document_id: row.document_id,
        source_langcode: row.source_langcode,
        target_status,
        profile_id: row.profile_id,
        job_id: row.job_id,
        document_archived: row.document_archived,
        updated_at: parse_timestamp(&row.updated_at),
    })
}

fn to_row(meta: &TranslationMetadata) -> (MetadataRow, Vec<TargetRow>) {
    let row = MetadataRow {
        unit_kind: meta.key.kind.as_str().to_string(),
        local_id: meta.key.local_id.clone(),
        document_id: meta.document_id.clone(),
        source_langcode: meta.source_langcode.clone(),
        source_status: meta.source_status.as_str().to_string(),
        profile_id: meta.profile_id.clone(),
        job_id: meta.job_id.clone(),
        document_archived: meta.document_archived,
        updated_at: meta.updated_at.to_rfc3339(),
    };
    let targets = meta
        .target_status
        .iter()
        .map(|(langcode, status)| TargetRow {
            langcode: langcode.clone(),
            status: status.as_str().to_string(),
        })
        .collect();
    (row, targets)
}

/// Metadata store backed by the SQLite database.
#[derive(Clone)]
pub struct SqliteMetadataStore {
    db: Database,
}

impl SqliteMetadataStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Opens the database named by `database_path`, or the default one.
    pub fn from_config(config: &EngineConfig) -> Result<Self, DatabaseError> {
        Database::open_configured(config.database_path.as_deref()).map(Self::new)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl MetadataStore for SqliteMetadataStore {
    fn load(&self, key: &UnitKey) -> Result<Option<TranslationMetadata>, DatabaseError> {
        Ok(
            metadata_repo::find(&self.db, key.kind.as_str(), &key.local_id)?
                .and_then(|(row, targets)| to_metadata(row, targets)),
        )
    }

    fn save(&self, meta: &TranslationMetadata) -> Result<(), DatabaseError> {
        let (row, targets) = to_row(meta);
        metadata_repo::upsert(&self.db, &row, &targets)
    }

    fn delete(&self, key: &UnitKey) -> Result<bool, DatabaseError> {
        metadata_repo::delete(&self.db, key.kind.as_str(), &key.local_id)
    }

    fn find_by_document_id(&self, document_id: &str) -> Result<Option<UnitKey>, DatabaseError> {
        Ok(metadata_repo::find_by_document_id(&self.db, document_id)?.and_then(|row| {
            UnitKind::parse(&row.unit_kind).map(|kind| UnitKey::new(kind, row.local_id))
        }))
    }

    fn query(
        &self,
        filter: &MetadataFilter,
    ) -> Result<(Vec<TranslationMetadata>, u64), DatabaseError> {
        let row_filter = MetadataRowFilter {
            unit_kind: filter.kind.map(|k| k.as_str().to_string()),
            source_status: filter.source_status.map(|s| s.as_str().to_string()),
            job_id: filter.job_id.clone(),
            document_id: filter.document_id.clone(),
            limit: filter.limit,
            offset: filter.offset,
        };
        let (rows, total) = metadata_repo::query(&self.db, &row_filter)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let targets = metadata_repo::find_targets(&self.db, &row.unit_kind, &row.local_id)?;
            if let Some(meta) = to_metadata(row, targets) {
                records.push(meta);
            }
        }
        Ok((records, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteMetadataStore {
        SqliteMetadataStore::new(Database::open_in_memory().unwrap())
    }

    #[test]
    fn test_round_trip_preserves_record() {
        let store = store();
        let key = UnitKey::field_group("node.article.body");
        let mut meta = TranslationMetadata::new(key.clone(), "en");
        meta.document_id = Some("doc-3".to_string());
        meta.source_status = SourceStatus::Current;
        meta.profile_id = Some("manual".to_string());
        meta.job_id = Some("launch".to_string());
        meta.document_archived = true;
        meta.target_status.insert("es".to_string(), TargetStatus::Ready);
        meta.target_status.insert("de".to_string(), TargetStatus::Disabled);
        store.save(&meta).unwrap();

        let loaded = store.load(&key).unwrap().unwrap();
        assert_eq!(loaded.key, key);
        assert_eq!(loaded.document_id, meta.document_id);
        assert_eq!(loaded.source_status, SourceStatus::Current);
        assert_eq!(loaded.target_status, meta.target_status);
        assert_eq!(loaded.profile_id, meta.profile_id);
        assert_eq!(loaded.job_id, meta.job_id);
        assert!(loaded.document_archived);
        assert_eq!(loaded.updated_at.timestamp(), meta.updated_at.timestamp());
    }

    #[test]
    fn test_unknown_status_falls_back() {
        let store = store();
        let row = MetadataRow {
            unit_kind: "content".to_string(),
            local_id: "1".to_string(),
            document_id: None,
            source_langcode: "en".to_string(),
            source_status: "LOST".to_string(),
            profile_id: None,
            job_id: None,
            document_archived: false,
            updated_at: "not a date".to_string(),
        };
        let targets = vec![TargetRow {
            langcode: "es".to_string(),
            status: "WHATEVER".to_string(),
        }];
        metadata_repo::upsert(store.database(), &row, &targets).unwrap();

        let meta = store.load(&UnitKey::content("1")).unwrap().unwrap();
        assert_eq!(meta.source_status, SourceStatus::Untracked);
        assert!(meta.target_status.is_empty());
    }

    #[test]
    fn test_find_by_document_and_query() {
        let store = store();
        for i in 0..3 {
            let mut meta = TranslationMetadata::new(UnitKey::content(i.to_string()), "en");
            meta.document_id = Some(format!("doc-{}", i));
            meta.source_status = if i == 0 {
                SourceStatus::Edited
            } else {
                SourceStatus::Current
            };
            store.save(&meta).unwrap();
        }

        assert_eq!(
            store.find_by_document_id("doc-2").unwrap(),
            Some(UnitKey::content("2"))
        );

        let filter = MetadataFilter {
            source_status: Some(SourceStatus::Current),
            ..Default::default()
        };
        let (records, total) = store.query(&filter).unwrap();
        assert_eq!(total, 2);
        assert!(records
            .iter()
            .all(|m| m.source_status == SourceStatus::Current));
    }

    #[test]
    fn test_from_config_uses_database_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("metadata.db");
        let mut config: EngineConfig = serde_json::from_str(r#"{"version": "1.0"}"#).unwrap();
        config.database_path = Some(path.to_string_lossy().into_owned());
        let key = UnitKey::content("5");

        let store = SqliteMetadataStore::from_config(&config).unwrap();
        store.save(&TranslationMetadata::new(key.clone(), "en")).unwrap();
        assert!(path.exists());

        let reopened = SqliteMetadataStore::new(Database::open(&path).unwrap());
        assert!(reopened.load(&key).unwrap().is_some());
    }

    #[test]
    fn test_file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.db");
        let key = UnitKey::config_object("system.site");
        {
            let store = SqliteMetadataStore::new(Database::open(&path).unwrap());
            store.save(&TranslationMetadata::new(key.clone(), "en")).unwrap();
        }
        let store = SqliteMetadataStore::new(Database::open(&path).unwrap());
        assert!(store.load(&key).unwrap().is_some());
    }
}
