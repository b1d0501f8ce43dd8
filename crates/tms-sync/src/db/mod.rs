//! SQLite persistence for translation metadata.
//!
//! Every worker shares one connection behind a mutex. Writers to the same
//! unit record are already serialized by the engine's unit locks, so the
//! mutex only orders statements.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::Connection;

pub mod error;
pub mod metadata_repo;
pub mod migrations;

pub use error::DatabaseError;

/// Another process holding the file (a second CMS worker) is waited on
/// this long before a statement fails.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared metadata database handle. Clones use the same connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens the database named by the `database_path` setting, falling back
    /// to [`default_database_path`].
    pub fn open_configured(database_path: Option<&str>) -> Result<Self, DatabaseError> {
        let path = match database_path {
            Some(path) => PathBuf::from(path),
            None => default_database_path().ok_or(DatabaseError::NoDatabasePath)?,
        };
        Self::open(&path)
    }

    /// Opens (or creates) a database file and brings its schema up to date.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let db = Self::prepare(conn)?;

        log::info!("Translation metadata database at {}", path.display());
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> Result<Self, DatabaseError> {
        // Target rows cascade with their metadata record
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::run_all(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Highest applied migration version.
    pub fn schema_version(&self) -> Result<u32, DatabaseError> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COALESCE(MAX(version), 0) FROM _migrations",
                [],
                |r| r.get(0),
            )?)
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }
}

/// `~/.tms-sync/data/tms-sync.db`
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".tms-sync").join("data").join("tms-sync.db"))
}
