/// Store lifecycle
///
/// This module owns the on-disk store:
/// - config.rs: where the store lives and how connections are tuned
/// - recovery.rs: open-or-recover at startup (backup, delete, recreate)
///
/// A `Store` is the explicit handle the rest of the application receives
/// after startup. It hands out `Library` units of work; there is no global
/// store anywhere.

pub mod config;
pub mod recovery;

use rusqlite::{Connection, OpenFlags};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::schema::migration::{MigrationError, MigrationPlan, MigrationReport};
use crate::state::library::Library;
use config::StoreConfig;

/// Errors raised while opening or using the store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error at {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("migration failed: {0}")]
    Migration(#[from] MigrationError),
    #[error("integrity check failed: {0}")]
    Corrupt(String),
    #[error("store location unavailable: {0}")]
    Location(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("invalid record: {0}")]
    Invalid(String),
    #[error("unit of work has unsaved changes")]
    UnsavedChanges,
    #[error("unit of work was rolled back by the database; pending changes are lost")]
    UnitOfWorkAborted,
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Handle to an opened, fully migrated store
#[derive(Debug)]
pub struct Store {
    config: StoreConfig,
    report: MigrationReport,
}

impl Store {
    /// Open the store, creating or migrating it to the live schema.
    ///
    /// Any failure here is an open failure; `recovery::open_store` decides
    /// what happens next.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        config.validate()?;
        std::fs::create_dir_all(config.root())
            .map_err(|err| StoreError::io(config.root(), err))?;

        let plan = MigrationPlan::claybook()?;
        let mut conn = open_connection(config)?;
        if config.integrity_check {
            quick_check(&conn)?;
        }
        let report = plan.migrate(&mut conn)?;

        info!(
            path = %config.store_path().display(),
            version = report.to,
            created = report.created,
            "store opened"
        );
        Ok(Self {
            config: config.clone(),
            report,
        })
    }

    /// Start a new unit of work
    pub fn library(&self) -> Result<Library, StoreError> {
        Library::open(&self.config)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn path(&self) -> PathBuf {
        self.config.store_path()
    }

    /// Schema version the store is at
    pub fn schema_version(&self) -> u32 {
        self.report.to
    }

    /// What opening the store had to do to the schema
    pub fn migration_report(&self) -> &MigrationReport {
        &self.report
    }
}

/// Opens a connection to the store file with the pragmas every
/// connection needs
pub(crate) fn open_connection(config: &StoreConfig) -> Result<Connection, StoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(config.store_path(), flags)?;
    apply_pragmas(&conn, config)?;
    Ok(conn)
}

/// Cascades need foreign keys; WAL gives readers a stable snapshot
fn apply_pragmas(conn: &Connection, config: &StoreConfig) -> Result<(), StoreError> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    Ok(())
}

fn quick_check(conn: &Connection) -> Result<(), StoreError> {
    let result: String = conn.query_row("PRAGMA quick_check", [], |row| row.get(0))?;
    debug!(result = %result, "quick_check");
    if result != "ok" {
        return Err(StoreError::Corrupt(result));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{self, v1};

    #[test]
    fn test_open_creates_fresh_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::at(dir.path().join("nested"));

        let store = Store::open(&config).unwrap();
        assert_eq!(store.schema_version(), schema::current().version);
        assert!(store.migration_report().created);
        assert!(store.path().exists());
    }

    #[test]
    fn test_reopen_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::at(dir.path());
        Store::open(&config).unwrap();

        let again = Store::open(&config).unwrap();
        assert!(again.migration_report().is_noop());
        assert_eq!(again.schema_version(), 4);
    }

    #[test]
    fn test_open_migrates_old_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::at(dir.path());
        {
            let conn = Connection::open(config.store_path()).unwrap();
            v1::SCHEMA.create(&conn).unwrap();
        }

        let store = Store::open(&config).unwrap();
        assert_eq!(store.migration_report().from, 1);
        assert_eq!(store.schema_version(), 4);
    }

    #[test]
    fn test_garbage_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::at(dir.path());
        std::fs::write(config.store_path(), vec![0x5a; 8192]).unwrap();

        assert!(Store::open(&config).is_err());
    }

    #[test]
    fn test_wal_companions_use_hyphen_names() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::at(dir.path());
        let store = Store::open(&config).unwrap();
        let library = store.library().unwrap();
        library.count(schema::Entity::Item).unwrap();

        assert!(config.store_files()[1].exists(), "expected {}", config.store_files()[1].display());
    }
}
