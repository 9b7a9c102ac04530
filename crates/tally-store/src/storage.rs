//! The durable storage slot.
//!
//! Tasks live under one named key. [`FileStorage`] keeps each key in
//! `<dir>/<key>.json`, replacing it atomically (temp file + rename).
//! [`MemoryStorage`] keeps values in a map and can be told to fail writes,
//! which is how quota and disabled-storage errors are simulated.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::errors::StorageError;

/// A key/value slot for serialized task collections.
pub trait StorageBackend: Send + Sync {
    /// Read the raw value under `key`; `None` if never written.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value under `key`.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One JSON file per key inside a data directory.
#[derive(Clone, Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Storage rooted at `dir` (created on first write).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The data directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl StorageBackend for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let io_err = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        std::fs::write(&tmp, value).map_err(io_err)?;
        std::fs::rename(&tmp, &path).map_err(io_err)
    }
}

/// In-process storage with write-failure injection.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
    attempts: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryStorage {
    /// Empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with one value.
    pub fn with_value(key: &str, value: &str) -> Self {
        let storage = Self::default();
        let _ = storage
            .values
            .lock()
            .insert(key.to_string(), value.to_string());
        storage
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Current value under `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    /// Number of write attempts, failed ones included.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Number of successful writes.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl StorageBackend for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _ = self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("quota exceeded".to_string()));
        }
        let _ = self
            .values
            .lock()
            .insert(key.to_string(), value.to_string());
        let _ = self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn file_storage_missing_key_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert_eq!(storage.read("tasks").unwrap(), None);
    }

    #[test]
    fn file_storage_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));
        storage.write("tasks", "[]").unwrap();
        storage.write("tasks", "[1]").unwrap();
        assert_eq!(storage.read("tasks").unwrap().as_deref(), Some("[1]"));
        assert!(dir.path().join("nested/tasks.json").exists());
        assert!(!dir.path().join("nested/.tasks.json.tmp").exists());
    }

    #[test]
    fn file_storage_rejects_path_keys() {
        let storage = FileStorage::new("/tmp");
        assert_matches!(storage.path_for("../etc"), Err(StorageError::InvalidKey(_)));
        assert_matches!(storage.path_for("a/b"), Err(StorageError::InvalidKey(_)));
        assert_matches!(storage.path_for(""), Err(StorageError::InvalidKey(_)));
    }

    #[test]
    fn file_storage_write_into_file_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a dir").unwrap();
        let storage = FileStorage::new(&blocker);
        assert_matches!(storage.write("tasks", "[]"), Err(StorageError::Io { .. }));
    }

    #[test]
    fn memory_storage_counts_writes() {
        let storage = MemoryStorage::new();
        storage.write("k", "v").unwrap();
        assert_eq!(storage.get("k").as_deref(), Some("v"));
        assert_eq!(storage.writes(), 1);
        assert_eq!(storage.attempts(), 1);
    }

    #[test]
    fn memory_storage_failure_injection() {
        let storage = MemoryStorage::with_value("k", "old");
        storage.set_fail_writes(true);
        assert_matches!(storage.write("k", "new"), Err(StorageError::Unavailable(_)));
        assert_eq!(storage.get("k").as_deref(), Some("old"));
        assert_eq!(storage.attempts(), 1);
        assert_eq!(storage.writes(), 0);
    }
}
