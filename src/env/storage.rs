//! Key-value persistence for recovery state.

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors raised by a persistence backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Session-scoped string store.
///
/// The loader only ever calls `get` and `set`; clearing is the host's job.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String) -> Result<(), StorageError>;
}

/// In-memory store that lives as long as the process does.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<DashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Sorted copy of every entry.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.inner
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).map(|r| r.value().clone())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.inner.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store mirrored to a JSON file on every write.
///
/// Used when the "session" has to survive the reload itself, e.g. a
/// supervisor that restarts a worker process.
#[derive(Debug)]
pub struct FileStore {
    inner: DashMap<String, String>,
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open the store at `path`, loading existing entries if the file exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let inner = DashMap::new();

        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            let map: BTreeMap<String, String> = serde_json::from_reader(reader)?;
            for (k, v) in map {
                inner.insert(k, v);
            }
            tracing::debug!(path = ?path, entries = inner.len(), "Loaded recovery state file");
        }

        Ok(Self {
            inner,
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sorted copy of every entry.
    pub fn entries(&self) -> BTreeMap<String, String> {
        self.inner
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    /// Drop one key. Returns whether it was present.
    pub fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let _guard = self.lock();
        if !self.inner.contains_key(key) {
            return Ok(false);
        }
        let mut next = self.entries();
        next.remove(key);
        write_atomic(&self.path, &next)?;
        self.inner.remove(key);
        Ok(true)
    }

    /// Drop every key.
    pub fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.lock();
        write_atomic(&self.path, &BTreeMap::new())?;
        self.inner.clear();
        Ok(())
    }

    /// Replace whatever is at `path` with an empty store, without reading it.
    ///
    /// Works on files too damaged for [`FileStore::open`].
    pub fn reset(path: impl AsRef<Path>) -> Result<(), StorageError> {
        write_atomic(path.as_ref(), &BTreeMap::new())
    }

    /// Serializes snapshot-write-apply so concurrent writers never drop each other's keys.
    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Write `entries` next to `path` and rename over it once durable.
///
/// Memory is only updated by callers after this returns `Ok`, so a failed
/// write leaves both the file and the map as they were.
fn write_atomic(path: &Path, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
    let tmp = path.with_extension("tmp");
    let mut writer = BufWriter::new(File::create(&tmp)?);
    serde_json::to_writer_pretty(&mut writer, entries)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    drop(writer);
    fs::rename(&tmp, path)?;
    Ok(())
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).map(|r| r.value().clone())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let _guard = self.lock();
        let mut next = self.entries();
        next.insert(key.to_string(), value.clone());
        write_atomic(&self.path, &next)?;
        self.inner.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_operations() {
        let store = MemoryStore::new();
        assert!(store.get("retry-lazy-A").is_none());
        assert!(store.is_empty());

        store.set("retry-lazy-A", "100".into()).unwrap();
        store.set("retry-lazy-A", "200".into()).unwrap();
        assert_eq!(store.get("retry-lazy-A").as_deref(), Some("200"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_memory_store_clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();
        other.set("k", "v".into()).unwrap();
        assert_eq!(store.snapshot().get("k").map(String::as_str), Some("v"));
    }

    #[test]
    fn test_file_store_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recovery.json");

        let store = FileStore::open(&path).unwrap();
        store.set("retry-lazy-Dashboard", "11000".into()).unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("retry-lazy-Dashboard").as_deref(), Some("11000"));
    }

    #[test]
    fn test_file_store_remove_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recovery.json");

        let store = FileStore::open(&path).unwrap();
        store.set("a", "1".into()).unwrap();
        store.set("b", "2".into()).unwrap();

        assert!(store.remove("a").unwrap());
        assert!(!store.remove("a").unwrap());
        assert_eq!(FileStore::open(&path).unwrap().entries().len(), 1);

        store.clear().unwrap();
        assert!(FileStore::open(&path).unwrap().entries().is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_file_store_reports_full_device() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recovery.json");
        let store = FileStore::open(&path).unwrap();
        std::os::unix::fs::symlink("/dev/full", path.with_extension("tmp")).unwrap();

        let result = store.set("retry-lazy-Dashboard", "0".into());
        assert!(matches!(result, Err(StorageError::Io(_))));
        assert!(store.get("retry-lazy-Dashboard").is_none());
    }

    #[test]
    fn test_failed_write_leaves_memory_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("recovery.json");
        let store = FileStore::open(&path).unwrap();

        assert!(store.set("retry-lazy-A", "0".into()).is_err());
        assert!(store.get("retry-lazy-A").is_none());
        assert!(store.clear().is_err());

        std::fs::create_dir(dir.path().join("missing")).unwrap();
        store.set("retry-lazy-A", "5".into()).unwrap();
        assert_eq!(store.get("retry-lazy-A").as_deref(), Some("5"));
    }

    #[test]
    fn test_failed_remove_keeps_key() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("state");
        std::fs::create_dir(&sub).unwrap();
        let path = sub.join("recovery.json");
        let store = FileStore::open(&path).unwrap();
        store.set("retry-lazy-A", "1".into()).unwrap();

        std::fs::remove_dir_all(&sub).unwrap();
        assert!(store.remove("retry-lazy-A").is_err());
        assert_eq!(store.get("retry-lazy-A").as_deref(), Some("1"));
    }

    #[test]
    fn test_write_replaces_file_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recovery.json");
        let store = FileStore::open(&path).unwrap();
        store.set("retry-lazy-A", "1".into()).unwrap();
        store.set("retry-lazy-B", "2".into()).unwrap();

        assert!(!path.with_extension("tmp").exists());
        assert_eq!(FileStore::open(&path).unwrap().entries().len(), 2);
    }

    #[test]
    fn test_reset_repairs_truncated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recovery.json");
        std::fs::write(&path, r#"{"retry-lazy-A": "1"#).unwrap();
        assert!(FileStore::open(&path).is_err());

        FileStore::reset(&path).unwrap();
        assert!(FileStore::open(&path).unwrap().entries().is_empty());
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recovery.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(FileStore::open(&path), Err(StorageError::Encode(_))));
    }
}
