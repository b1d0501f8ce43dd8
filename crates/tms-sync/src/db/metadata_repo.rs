//! CRUD for the `translation_metadata` and `translation_targets` tables.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Database, DatabaseError};

const METADATA_TABLE: &str = "translation_metadata";
const TARGETS_TABLE: &str = "translation_targets";

/// A raw metadata row. Statuses and timestamps are kept as strings here
/// and parsed by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRow {
    pub unit_kind: String,
    pub local_id: String,
    pub document_id: Option<String>,
    pub source_langcode: String,
    pub source_status: String,
    pub profile_id: Option<String>,
    pub job_id: Option<String>,
    pub document_archived: bool,
    pub updated_at: String,
}

impl MetadataRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            unit_kind: row.get("unit_kind")?,
            local_id: row.get("local_id")?,
            document_id: row.get("document_id")?,
            source_langcode: row.get("source_langcode")?,
            source_status: row.get("source_status")?,
            profile_id: row.get("profile_id")?,
            job_id: row.get("job_id")?,
            document_archived: row.get("document_archived")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRow {
    pub langcode: String,
    pub status: String,
}

/// Query filter for metadata listing.
#[derive(Debug, Default, Clone)]
pub struct MetadataRowFilter {
    pub unit_kind: Option<String>,
    pub source_status: Option<String>,
    pub job_id: Option<String>,
    pub document_id: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Inserts or replaces a record together with its full target set.
pub fn upsert(db: &Database, row: &MetadataRow, targets: &[TargetRow]) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO translation_metadata (unit_kind, local_id, document_id, source_langcode,
             source_status, profile_id, job_id, document_archived, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT (unit_kind, local_id) DO UPDATE SET
             document_id=excluded.document_id, source_langcode=excluded.source_langcode,
             source_status=excluded.source_status, profile_id=excluded.profile_id,
             job_id=excluded.job_id, document_archived=excluded.document_archived,
             updated_at=excluded.updated_at",
            params![
                row.unit_kind,
                row.local_id,
                row.document_id,
                row.source_langcode,
                row.source_status,
                row.profile_id,
                row.job_id,
                row.document_archived,
                row.updated_at,
            ],
        )?;
        tx.execute(
            "DELETE FROM translation_targets WHERE unit_kind = ?1 AND local_id = ?2",
            params![row.unit_kind, row.local_id],
        )?;
        for target in targets {
            tx.execute(
                "INSERT INTO translation_targets (unit_kind, local_id, langcode, status)
                 VALUES (?1, ?2, ?3, ?4)",
                params![row.unit_kind, row.local_id, target.langcode, target.status],
            )?;
        }
        tx.commit()?;
        Ok(())
    })
    .map_err(|e| e.for_record(METADATA_TABLE, &row.unit_kind, &row.local_id))
}

fn targets_of(
    conn: &Connection,
    unit_kind: &str,
    local_id: &str,
) -> Result<Vec<TargetRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT langcode, status FROM translation_targets
         WHERE unit_kind = ?1 AND local_id = ?2 ORDER BY langcode",
    )?;
    let rows = stmt
        .query_map(params![unit_kind, local_id], |r| {
            Ok(TargetRow {
                langcode: r.get(0)?,
                status: r.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Finds a record and its targets.
pub fn find(
    db: &Database,
    unit_kind: &str,
    local_id: &str,
) -> Result<Option<(MetadataRow, Vec<TargetRow>)>, DatabaseError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                "SELECT * FROM translation_metadata WHERE unit_kind = ?1 AND local_id = ?2",
                params![unit_kind, local_id],
                MetadataRow::from_row,
            )
            .optional()?;
        match row {
            Some(row) => {
                let targets = targets_of(conn, unit_kind, local_id)?;
                Ok(Some((row, targets)))
            }
            None => Ok(None),
        }
    })
    .map_err(|e| e.for_record(METADATA_TABLE, unit_kind, local_id))
}

/// Loads the targets of one record, ordered by langcode.
pub fn find_targets(
    db: &Database,
    unit_kind: &str,
    local_id: &str,
) -> Result<Vec<TargetRow>, DatabaseError> {
    db.with_conn(|conn| targets_of(conn, unit_kind, local_id))
        .map_err(|e| e.for_record(TARGETS_TABLE, unit_kind, local_id))
}

/// Deletes a record; targets go with it. Returns whether a row existed.
pub fn delete(db: &Database, unit_kind: &str, local_id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute(
            "DELETE FROM translation_metadata WHERE unit_kind = ?1 AND local_id = ?2",
            params![unit_kind, local_id],
        )?;
        Ok(affected > 0)
    })
    .map_err(|e| e.for_record(METADATA_TABLE, unit_kind, local_id))
}

pub fn find_by_document_id(
    db: &Database,
    document_id: &str,
) -> Result<Option<MetadataRow>, DatabaseError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                "SELECT * FROM translation_metadata WHERE document_id = ?1 LIMIT 1",
                params![document_id],
                MetadataRow::from_row,
            )
            .optional()?;
        Ok(row)
    })
}

/// Queries records with filters, returning (rows, total_count).
pub fn query(
    db: &Database,
    filter: &MetadataRowFilter,
) -> Result<(Vec<MetadataRow>, u64), DatabaseError> {
    db.with_conn(|conn| {
        let mut conditions = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref unit_kind) = filter.unit_kind {
            conditions.push(format!("unit_kind = ?{}", param_values.len() + 1));
            param_values.push(Box::new(unit_kind.clone()));
        }
        if let Some(ref source_status) = filter.source_status {
            conditions.push(format!("source_status = ?{}", param_values.len() + 1));
            param_values.push(Box::new(source_status.clone()));
        }
        if let Some(ref job_id) = filter.job_id {
            conditions.push(format!("job_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(job_id.clone()));
        }
        if let Some(ref document_id) = filter.document_id {
            conditions.push(format!("document_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(document_id.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM translation_metadata {}", where_clause);
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let total: u64 = conn.query_row(&count_sql, params_ref.as_slice(), |r| r.get(0))?;

        let limit = filter.limit.unwrap_or(100) as i64;
        let offset = filter.offset.unwrap_or(0) as i64;
        param_values.push(Box::new(limit));
        param_values.push(Box::new(offset));
        let query_sql = format!(
            "SELECT * FROM translation_metadata {} ORDER BY unit_kind, local_id LIMIT ?{} OFFSET ?{}",
            where_clause,
            param_values.len() - 1,
            param_values.len()
        );

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&query_sql)?;
        let rows: Vec<MetadataRow> = stmt
            .query_map(params_ref.as_slice(), MetadataRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((rows, total))
    })
}
