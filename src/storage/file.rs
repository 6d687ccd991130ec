//! JSON-file-based storage backend.
//!
//! Stores each key in a separate JSON file under a configurable
//! directory (default: `$XDG_DATA_HOME/budgetpilot/`).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use super::{Storage, lock_poison_error, validate_key};
use crate::error::{BudgetPilotError, Result};

/// Application name used for the XDG data directory.
const APP_NAME: &str = "budgetpilot";

/// Extension of document files.
const EXTENSION: &str = "json";

/// Sentinel file used for cross-process file locking.
const LOCK_FILE: &str = "storage.lock";

/// File-backed storage that persists each key as `<key>.json`.
///
/// # Concurrency
///
/// Thread safety within a single process is provided by an in-process
/// [`Mutex`]. Cross-process safety is achieved via an advisory file lock
/// on `storage.lock` (using [`std::fs::File::lock`] /
/// [`std::fs::File::lock_shared`]).
///
/// Read operations acquire a shared lock (allowing concurrent readers),
/// while write operations acquire an exclusive lock. Writes go to a
/// temporary file that is then renamed over the target.
///
/// # File layout
///
/// ```text
/// <dir>/
///   storage.lock          (cross-process lock sentinel)
///   budgets_v1.json
///   savings_goals_v1.json
/// ```
#[derive(Debug)]
pub struct FileStorage {
    /// Root directory containing all JSON files.
    dir: PathBuf,
    /// Mutex serializing concurrent in-process access.
    lock: Mutex<()>,
    /// Sentinel file for cross-process advisory locking.
    lock_file: fs::File,
}

impl FileStorage {
    /// Creates a new file storage rooted at the given directory.
    ///
    /// Creates the directory (and parents) if it does not exist. Also
    /// opens (or creates) the `storage.lock` sentinel file used for
    /// cross-process advisory locking.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the lock
    /// file cannot be opened.
    #[inline]
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).map_err(storage_io_error)?;
        let lock_file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))
            .map_err(storage_io_error)?;
        Ok(Self {
            dir,
            lock: Mutex::new(()),
            lock_file,
        })
    }

    /// Returns the default XDG-compliant data directory for this application.
    ///
    /// On Linux: `$XDG_DATA_HOME/budgetpilot/` (typically
    /// `~/.local/share/budgetpilot/`).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform data directory cannot be determined.
    #[inline]
    pub fn default_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|data_path| data_path.join(APP_NAME))
            .ok_or_else(|| {
                BudgetPilotError::Storage("could not determine platform data directory".into())
            })
    }

    /// Directory this storage writes to.
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the document path for a validated key.
    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{EXTENSION}"))
    }

    /// Acquires an in-process mutex guard and a shared (read) file lock,
    /// executes `op`, then releases the file lock.
    fn with_shared_lock<R, F: FnOnce() -> Result<R>>(&self, op: F) -> Result<R> {
        let _guard: MutexGuard<'_, ()> = self.lock.lock().map_err(|err| lock_poison_error(&err))?;
        self.lock_file.lock_shared().map_err(storage_io_error)?;
        let result = op();
        // Only surface the unlock error when the operation succeeded;
        // otherwise the original error is more useful.
        if let Err(err) = self.lock_file.unlock()
            && result.is_ok()
        {
            return Err(storage_io_error(err));
        }
        result
    }

    /// Acquires an in-process mutex guard and an exclusive (write) file
    /// lock, executes `op`, then releases the file lock.
    fn with_exclusive_lock<R, F: FnOnce() -> Result<R>>(&self, op: F) -> Result<R> {
        let _guard: MutexGuard<'_, ()> = self.lock.lock().map_err(|err| lock_poison_error(&err))?;
        self.lock_file.lock().map_err(storage_io_error)?;
        let result = op();
        if let Err(err) = self.lock_file.unlock()
            && result.is_ok()
        {
            return Err(storage_io_error(err));
        }
        result
    }
}

impl Storage for FileStorage {
    #[inline]
    fn read(&self, key: &str) -> Result<Option<Value>> {
        validate_key(key)?;
        let path = self.path(key);
        self.with_shared_lock(|| match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(storage_io_error(err)),
        })
    }

    #[inline]
    fn write(&self, key: &str, value: &Value) -> Result<()> {
        validate_key(key)?;
        let path = self.path(key);
        let tmp_path = self.dir.join(format!("{key}.{EXTENSION}.tmp"));
        let json = serde_json::to_string_pretty(value)?;
        self.with_exclusive_lock(|| {
            fs::write(&tmp_path, json).map_err(storage_io_error)?;
            fs::rename(&tmp_path, &path).map_err(storage_io_error)
        })
    }

    #[inline]
    fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.path(key);
        self.with_exclusive_lock(|| match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(storage_io_error(err)),
        })
    }
}

/// Wraps an I/O error into a [`BudgetPilotError::Storage`].
fn storage_io_error(err: io::Error) -> BudgetPilotError {
    BudgetPilotError::Storage(Box::new(err))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    /// Helper to create a [`FileStorage`] in a temporary directory.
    fn temp_storage() -> (FileStorage, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        (storage, dir)
    }

    #[test]
    fn read_missing_key_is_none() {
        let (storage, _dir) = temp_storage();
        assert!(storage.read("budgets_v1").unwrap().is_none());
    }

    #[test]
    fn write_and_read_round_trip() {
        let (storage, _dir) = temp_storage();
        let value = json!({"2024-01": {"food": 300.0}});
        storage.write("budgets_v1", &value).unwrap();
        assert_eq!(storage.read("budgets_v1").unwrap(), Some(value));
        assert!(storage.dir().join("budgets_v1.json").exists());
        assert!(!storage.dir().join("budgets_v1.json.tmp").exists());
    }

    #[test]
    fn persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
            storage.write("savings_goals_v1", &json!([{"id": "g_1"}])).unwrap();
        }
        let reopened = FileStorage::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(
            reopened.read("savings_goals_v1").unwrap(),
            Some(json!([{"id": "g_1"}]))
        );
    }

    #[test]
    fn remove_deletes_file_and_tolerates_missing() {
        let (storage, _dir) = temp_storage();
        storage.write("goals", &json!([])).unwrap();
        storage.remove("goals").unwrap();
        assert!(storage.read("goals").unwrap().is_none());
        storage.remove("goals").unwrap();
    }

    #[test]
    fn corrupt_file_is_a_serialization_error() {
        let (storage, dir) = temp_storage();
        fs::write(dir.path().join("budgets_v1.json"), "{not json").unwrap();
        let err = storage.read("budgets_v1").unwrap_err();
        assert!(matches!(err, BudgetPilotError::Serialization(_)));
    }

    #[test]
    fn rejects_path_traversal_keys() {
        let (storage, _dir) = temp_storage();
        for key in ["../outside", ".lock", "nested/key", ""] {
            let err = storage.write(key, &json!(1)).unwrap_err();
            assert!(matches!(err, BudgetPilotError::InvalidKey(_)), "{key}");
        }
    }

    #[test]
    fn creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let storage = FileStorage::new(nested.clone()).unwrap();
        storage.write("k", &json!(true)).unwrap();
        assert!(nested.join("k.json").exists());
        assert!(nested.join(LOCK_FILE).exists());
    }

    #[test]
    fn default_dir_ends_with_app_name() {
        if let Ok(dir) = FileStorage::default_dir() {
            assert!(dir.ends_with(APP_NAME));
        }
    }
}
