/// Store recovery
///
/// Runs once at startup, before anything else gets a `Library`:
/// 1. Open normally (create or migrate). Success is `Healthy`.
/// 2. On failure, copy every store file into `Backups/`, each name
///    prefixed with an ISO-8601 timestamp. Per-file failures are skipped.
/// 3. Delete the store files and open a fresh, empty store.
///    Success is `RecoveredFromBackup`; failure is `Failed`.
///
/// The steps run strictly in that order. Nothing is deleted unless the
/// backup directory exists and every copy has been attempted.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use super::config::StoreConfig;
use super::{Store, StoreError};

/// Outcome of opening the store at startup
#[derive(Debug)]
pub enum StoreState {
    /// Opened (and migrated if needed) without loss
    Healthy(Store),
    /// The old store was unreadable; it was backed up and replaced by an
    /// empty one. Callers must tell the user.
    RecoveredFromBackup {
        store: Store,
        backup: BackupReport,
        /// Why the original store could not be opened
        cause: StoreError,
    },
    /// Not even a fresh store could be created
    Failed(StoreError),
}

impl StoreState {
    pub fn store(&self) -> Option<&Store> {
        match self {
            StoreState::Healthy(store) | StoreState::RecoveredFromBackup { store, .. } => {
                Some(store)
            }
            StoreState::Failed(_) => None,
        }
    }

    /// Running, but the previous data is gone
    pub fn is_degraded(&self) -> bool {
        matches!(self, StoreState::RecoveredFromBackup { .. })
    }
}

/// Files copied by a backup pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupReport {
    pub backup_dir: PathBuf,
    /// Destination of every successful copy
    pub backed_up: Vec<PathBuf>,
    /// Store files that existed but could not be copied
    pub skipped: Vec<PathBuf>,
}

/// Open the store, recovering from an unreadable one
pub fn open_store(config: &StoreConfig) -> StoreState {
    open_store_at(config, Utc::now())
}

/// `open_store` with the backup timestamp supplied by the caller
pub fn open_store_at(config: &StoreConfig, now: DateTime<Utc>) -> StoreState {
    // A bad location is not a bad store; never back up or delete for it
    if let Err(err) = config.validate() {
        error!(error = %err, "store location is invalid, not attempting recovery");
        return StoreState::Failed(err);
    }

    let cause = match Store::open(config) {
        Ok(store) => return StoreState::Healthy(store),
        Err(err) => err,
    };
    warn!(
        path = %config.store_path().display(),
        error = %cause,
        "store open failed, attempting backup and recovery"
    );

    let backup = match backup_store_files(config, now) {
        Ok(backup) => backup,
        Err(err) => {
            error!(error = %err, "could not prepare backup, leaving store files in place");
            return StoreState::Failed(err);
        }
    };

    if let Err(err) = delete_store_files(config) {
        error!(error = %err, "could not delete unreadable store files");
        return StoreState::Failed(err);
    }

    match Store::open(config) {
        Ok(store) => {
            warn!(
                backup_dir = %backup.backup_dir.display(),
                files = backup.backed_up.len(),
                "started with a fresh store, previous data backed up"
            );
            StoreState::RecoveredFromBackup {
                store,
                backup,
                cause,
            }
        }
        Err(err) => {
            error!(error = %err, "recovery failed, no usable store");
            StoreState::Failed(err)
        }
    }
}

/// ISO-8601 timestamp with colons swapped for hyphens
pub fn backup_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, true).replace(':', "-")
}

pub fn backup_file_name(timestamp: &str, file_name: &str) -> String {
    format!("{timestamp}_{file_name}")
}

/// Copy the primary store file and its companions into the backup directory.
///
/// Missing files are not an error, and a file that fails to copy is
/// logged and skipped. Only failing to create the directory is an error.
pub fn backup_store_files(
    config: &StoreConfig,
    now: DateTime<Utc>,
) -> Result<BackupReport, StoreError> {
    let backup_dir = config.backup_dir();
    fs::create_dir_all(&backup_dir).map_err(|err| StoreError::io(&backup_dir, err))?;

    let timestamp = backup_timestamp(now);
    let mut report = BackupReport {
        backup_dir: backup_dir.clone(),
        ..BackupReport::default()
    };

    for file in config.store_files() {
        if !file.is_file() {
            debug!(file = %file.display(), "no file to back up");
            continue;
        }
        let Some(name) = file.file_name() else {
            continue;
        };
        let destination = free_destination(&backup_dir, &timestamp, &name.to_string_lossy());

        match fs::copy(&file, &destination) {
            Ok(bytes) => {
                info!(
                    file = %file.display(),
                    backup = %destination.display(),
                    bytes,
                    "backed up store file"
                );
                report.backed_up.push(destination);
            }
            Err(err) => {
                warn!(file = %file.display(), error = %err, "skipping store file backup");
                report.skipped.push(file);
            }
        }
    }

    Ok(report)
}

/// First backup path not already taken. Recoveries within the same second
/// get `<timestamp>-1_<name>`, `<timestamp>-2_<name>` and so on.
fn free_destination(backup_dir: &Path, timestamp: &str, file_name: &str) -> PathBuf {
    let mut destination = backup_dir.join(backup_file_name(timestamp, file_name));
    let mut n = 1u32;
    // symlink_metadata also sees dangling links, which fs::copy would follow
    while fs::symlink_metadata(&destination).is_ok() {
        destination = backup_dir.join(backup_file_name(&format!("{timestamp}-{n}"), file_name));
        n += 1;
    }
    destination
}

/// Remove the primary store file and its companions; returns what was removed
pub fn delete_store_files(config: &StoreConfig) -> Result<Vec<PathBuf>, StoreError> {
    let mut removed = Vec::new();
    for file in config.store_files() {
        match fs::remove_file(&file) {
            Ok(()) => {
                debug!(file = %file.display(), "deleted store file");
                removed.push(file);
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(StoreError::io(&file, err)),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
    }

    #[test]
    fn test_backup_timestamp_has_no_colons() {
        assert_eq!(backup_timestamp(fixed_now()), "2026-03-14T09-26-53Z");
        assert_eq!(
            backup_file_name("2026-03-14T09-26-53Z", "default.store-wal"),
            "2026-03-14T09-26-53Z_default.store-wal"
        );
    }

    #[test]
    fn test_backup_skips_missing_companions() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::at(dir.path());
        fs::write(config.store_path(), b"not a database").unwrap();

        let report = backup_store_files(&config, fixed_now()).unwrap();
        assert!(report.skipped.is_empty());
        assert_eq!(
            report.backed_up,
            vec![config.backup_dir().join("2026-03-14T09-26-53Z_default.store")]
        );
        assert_eq!(fs::read(&report.backed_up[0]).unwrap(), b"not a database");
    }

    #[test]
    fn test_backup_copies_companions() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::at(dir.path());
        for file in config.store_files() {
            fs::write(&file, b"x").unwrap();
        }

        let report = backup_store_files(&config, fixed_now()).unwrap();
        let names: Vec<String> = report
            .backed_up
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "2026-03-14T09-26-53Z_default.store",
                "2026-03-14T09-26-53Z_default.store-wal",
                "2026-03-14T09-26-53Z_default.store-shm",
            ]
        );
    }

    #[test]
    fn test_delete_ignores_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::at(dir.path());
        fs::write(config.store_path(), b"x").unwrap();

        let removed = delete_store_files(&config).unwrap();
        assert_eq!(removed, vec![config.store_path()]);
        assert!(config.store_files().iter().all(|file| !file.exists()));
    }

    #[test]
    fn test_healthy_store() {
        let dir = tempfile::tempdir().unwrap();
        let state = open_store(&StoreConfig::at(dir.path()));
        assert!(matches!(state, StoreState::Healthy(_)));
        assert!(!state.is_degraded());
    }

    #[test]
    fn test_corrupt_store_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::at(dir.path());
        fs::write(config.store_path(), vec![0xA5; 4096]).unwrap();

        let state = open_store_at(&config, fixed_now());
        match &state {
            StoreState::RecoveredFromBackup { store, backup, .. } => {
                assert_eq!(store.schema_version(), 4);
                assert_eq!(backup.backed_up.len(), 1);
                assert_eq!(fs::read(&backup.backed_up[0]).unwrap(), vec![0xA5; 4096]);
            }
            other => panic!("expected recovery, got {other:?}"),
        }
        assert!(state.is_degraded());
        assert!(state.store().is_some());
    }

    #[test]
    fn test_unwritable_backup_dir_fails_without_deleting() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::at(dir.path());
        fs::write(config.store_path(), vec![0xA5; 4096]).unwrap();
        // A plain file where the backup directory should go
        fs::write(config.backup_dir(), b"in the way").unwrap();

        let state = open_store_at(&config, fixed_now());
        assert!(matches!(state, StoreState::Failed(StoreError::Io { .. })));
        assert_eq!(fs::read(config.store_path()).unwrap(), vec![0xA5; 4096]);
    }

    #[test]
    fn test_invalid_location_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StoreConfig::at(dir.path());
        fs::write(config.store_path(), vec![0xA5; 4096]).unwrap();
        config.backup_dir_name = "nested/Backups".to_string();

        let state = open_store_at(&config, fixed_now());
        assert!(matches!(state, StoreState::Failed(StoreError::Location(_))));
        assert_eq!(fs::read(config.store_path()).unwrap(), vec![0xA5; 4096]);
        assert!(!dir.path().join("nested").exists());
    }

    #[test]
    fn test_empty_root_fails_before_any_file_access() {
        let state = open_store(&StoreConfig::default());
        assert!(matches!(state, StoreState::Failed(StoreError::Location(_))));
    }

    #[test]
    fn test_same_second_backup_keeps_earlier_copy() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::at(dir.path());
        fs::create_dir_all(config.backup_dir()).unwrap();
        let earlier = config.backup_dir().join("2026-03-14T09-26-53Z_default.store");
        fs::write(&earlier, b"earlier backup").unwrap();
        fs::write(config.store_path(), vec![0xA5; 4096]).unwrap();

        let state = open_store_at(&config, fixed_now());
        match &state {
            StoreState::RecoveredFromBackup { backup, .. } => {
                assert_eq!(
                    backup.backed_up,
                    vec![config.backup_dir().join("2026-03-14T09-26-53Z-1_default.store")]
                );
                assert_eq!(fs::read(&backup.backed_up[0]).unwrap(), vec![0xA5; 4096]);
            }
            other => panic!("expected recovery, got {other:?}"),
        }
        assert_eq!(fs::read(&earlier).unwrap(), b"earlier backup");
    }

    #[test]
    fn test_suffix_skips_every_taken_name() {
        let dir = tempfile::tempdir().unwrap();
        let backup_dir = dir.path();
        fs::write(backup_dir.join("T_a.store"), b"0").unwrap();
        fs::write(backup_dir.join("T-1_a.store"), b"1").unwrap();

        assert_eq!(free_destination(backup_dir, "T", "a.store"), backup_dir.join("T-2_a.store"));
        assert_eq!(free_destination(backup_dir, "U", "a.store"), backup_dir.join("U_a.store"));
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_copy_is_skipped_and_recovery_continues() {
        let dir = tempfile::tempdir().unwrap();
        // Fits as a file name, but not once the timestamp prefix is added
        let mut config = StoreConfig::at(dir.path());
        config.store_file_name = "s".repeat(240);
        fs::write(config.store_path(), vec![0xA5; 4096]).unwrap();

        let state = open_store_at(&config, fixed_now());
        match &state {
            StoreState::RecoveredFromBackup { store, backup, .. } => {
                assert!(backup.backed_up.is_empty());
                assert!(backup.skipped.contains(&config.store_path()));
                assert_eq!(store.schema_version(), 4);
            }
            other => panic!("expected recovery, got {other:?}"),
        }
    }
}
