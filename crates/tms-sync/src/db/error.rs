use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A statement failed while reading or writing one unit's record.
    #[error("SQLite error on {table} record of {unit}: {source}")]
    Record {
        table: &'static str,
        unit: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Cannot create database directory '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Metadata schema migration v{version} failed: {reason}")]
    Migration { version: u32, reason: String },

    #[error("No database_path configured and no home directory to default to")]
    NoDatabasePath,

    #[error("Metadata store lock poisoned")]
    LockPoisoned,
}

impl DatabaseError {
    /// Names the unit record a raw SQLite failure happened on. Other
    /// variants pass through unchanged.
    pub fn for_record(self, table: &'static str, unit_kind: &str, local_id: &str) -> Self {
        match self {
            DatabaseError::Sqlite(source) => DatabaseError::Record {
                table,
                unit: format!("{}:{}", unit_kind, local_id),
                source,
            },
            other => other,
        }
    }
}
