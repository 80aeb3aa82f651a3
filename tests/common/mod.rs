//! Shared fakes for recovery integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use resilient_loader::env::{KeyValueStore, ManualClock, MemoryStore, StorageError};
use resilient_loader::{ReloadTrigger, ResilientLoader};

pub const STALE_CHUNK: &str = "Failed to fetch dynamically imported module";

/// Error returned by fake loaders.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ImportError(pub String);

impl ImportError {
    pub fn stale(unit: &str) -> Self {
        Self(format!("TypeError: {}: https://app.example/assets/{}-4be1.js", STALE_CHUNK, unit))
    }
}

/// Memory store that counts reads and keeps every write.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    reads: AtomicUsize,
    writes: Mutex<Vec<(String, String)>>,
}

impl RecordingStore {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn seed(&self, key: &str, value: &str) {
        self.inner.set(key, value.to_string()).unwrap();
    }
}

impl KeyValueStore for RecordingStore {
    fn get(&self, key: &str) -> Option<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.writes.lock().unwrap().push((key.to_string(), value.clone()));
        self.inner.set(key, value)
    }
}

/// Reload trigger that only counts.
#[derive(Default)]
pub struct CountingReload {
    calls: AtomicUsize,
}

impl CountingReload {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ReloadTrigger for CountingReload {
    fn reload(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Harness {
    pub loader: ResilientLoader,
    pub store: Arc<RecordingStore>,
    pub reload: Arc<CountingReload>,
    pub clock: ManualClock,
}

pub fn harness(start_millis: u64) -> Harness {
    let store = Arc::new(RecordingStore::default());
    let reload = Arc::new(CountingReload::default());
    let clock = ManualClock::new(start_millis);
    let loader = ResilientLoader::new(store.clone(), reload.clone()).with_clock(Arc::new(clock.clone()));

    Harness {
        loader,
        store,
        reload,
        clock,
    }
}
