/// Store location and tuning
///
/// The store lives in the user's data directory:
/// - Linux: ~/.local/share/claybook/default.store
/// - macOS: ~/Library/Application Support/claybook/default.store
/// - Windows: %APPDATA%\claybook\default.store
///
/// `CLAYBOOK_DATA_DIR` overrides the root directory.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::StoreError;

/// Environment variable overriding the store root
pub const DATA_DIR_ENV: &str = "CLAYBOOK_DATA_DIR";

const DEFAULT_STORE_FILE_NAME: &str = "default.store";
const DEFAULT_BACKUP_DIR_NAME: &str = "Backups";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Suffixes of the SQLite companion files (hyphen, not a dot extension)
pub const COMPANION_SUFFIXES: [&str; 2] = ["-wal", "-shm"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Application-private directory holding the store and its backups
    pub root: PathBuf,
    pub store_file_name: String,
    pub backup_dir_name: String,
    pub busy_timeout_ms: u64,
    /// Run `PRAGMA quick_check` when opening
    pub integrity_check: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::at(PathBuf::new())
    }
}

impl StoreConfig {
    /// Config rooted at an explicit directory
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            store_file_name: DEFAULT_STORE_FILE_NAME.to_string(),
            backup_dir_name: DEFAULT_BACKUP_DIR_NAME.to_string(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            integrity_check: true,
        }
    }

    /// Config for the per-user default location
    pub fn default_location() -> Result<Self, StoreError> {
        if let Some(root) = std::env::var_os(DATA_DIR_ENV).filter(|value| !value.is_empty()) {
            return Ok(Self::at(root));
        }

        let mut root = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StoreError::Location("could not determine user data directory".into()))?;
        root.push("claybook");
        Ok(Self::at(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Primary store file
    pub fn store_path(&self) -> PathBuf {
        self.root.join(&self.store_file_name)
    }

    /// Primary file followed by its `-wal` and `-shm` companions
    pub fn store_files(&self) -> Vec<PathBuf> {
        let mut files = vec![self.store_path()];
        for suffix in COMPANION_SUFFIXES {
            files.push(self.root.join(format!("{}{}", self.store_file_name, suffix)));
        }
        files
    }

    /// Sibling directory receiving copies of unreadable stores
    pub fn backup_dir(&self) -> PathBuf {
        self.root.join(&self.backup_dir_name)
    }

    /// Reject configs that could never name a store file
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.root.as_os_str().is_empty() {
            return Err(StoreError::Location("store root must not be empty".into()));
        }
        let plain =
            |name: &str| !name.is_empty() && !name.contains(|c: char| c == '/' || c == '\\');
        if !plain(&self.store_file_name) || !plain(&self.backup_dir_name) {
            return Err(StoreError::Location(
                "store and backup names must be plain file names".into(),
            ));
        }
        if self.store_path().is_dir() {
            return Err(StoreError::Location(format!(
                "{} is a directory, not a store file",
                self.store_path().display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_files_use_hyphen_suffix() {
        let config = StoreConfig::at("/data/claybook");
        let names: Vec<String> = config
            .store_files()
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["default.store", "default.store-wal", "default.store-shm"]);
        assert!(config.store_files().iter().all(|path| path.parent() == Some(config.root())));
    }

    #[test]
    fn test_backup_dir_is_sibling() {
        let config = StoreConfig::at("/data/claybook");
        assert_eq!(config.backup_dir(), PathBuf::from("/data/claybook/Backups"));
        assert_eq!(config.store_path(), PathBuf::from("/data/claybook/default.store"));
    }

    #[test]
    fn test_validate() {
        assert!(StoreConfig::default().validate().is_err());
        assert!(StoreConfig::at("/data/claybook").validate().is_ok());

        let mut nested = StoreConfig::at("/data/claybook");
        nested.store_file_name = "nested/default.store".into();
        assert!(nested.validate().is_err());

        let dir = tempfile::tempdir().unwrap();
        let mut shadowed = StoreConfig::at(dir.path());
        std::fs::create_dir(shadowed.store_path()).unwrap();
        assert!(shadowed.validate().is_err());
        shadowed.store_file_name = "other.store".into();
        assert!(shadowed.validate().is_ok());
    }
}
