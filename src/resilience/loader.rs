//! Resilient wrapper around on-demand code loading.
//!
//! # Flow
//! ```text
//! LazyUnit::load()
//!     → loader()                       Ok  → module (no state touched)
//!     → Err: classify.rs
//!         Other                        → log, return Err unchanged
//!         ChunkFetch: cooldown.rs
//!             within cooldown          → log, return Err unchanged
//!             expired / never reloaded → write now, reload, park forever
//! ```
//!
//! # Concurrency
//! The read-then-write of a unit's recovery state is not atomic. Two loads
//! of the same unit failing at the same instant can both see an expired
//! cooldown and both request a reload. The reload itself is idempotent at
//! the process level, so this is tolerated rather than locked away.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use crate::config::{LoaderConfig, RecoveryConfig};
use crate::env::{Clock, FileStore, KeyValueStore, MemoryStore, ReloadTrigger, StorageError, SystemClock};
use crate::observability::metrics;
use crate::resilience::classify::{FailureClass, FailureClassifier};
use crate::resilience::cooldown::{
    recovery_key, RecoveryState, DEFAULT_COOLDOWN, DEFAULT_KEY_PREFIX, FALLBACK_UNIT_NAME,
};
use crate::resilience::stall;

/// Tunables for failure recovery.
#[derive(Debug, Clone)]
pub struct RecoveryPolicy {
    /// At most one reload per unit inside this window.
    pub cooldown: Duration,
    /// Prepended to the unit name to form its storage key.
    pub key_prefix: String,
    /// Unit name used when none is supplied.
    pub fallback_name: String,
    pub classifier: FailureClassifier,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            fallback_name: FALLBACK_UNIT_NAME.to_string(),
            classifier: FailureClassifier::default(),
        }
    }
}

impl From<&RecoveryConfig> for RecoveryPolicy {
    fn from(config: &RecoveryConfig) -> Self {
        Self {
            cooldown: Duration::from_millis(config.cooldown_ms),
            key_prefix: config.key_prefix.clone(),
            fallback_name: config.fallback_name.clone(),
            classifier: FailureClassifier::new(config.chunk_error_patterns.iter().cloned()),
        }
    }
}

/// What happens to a failed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Hand the error back to the caller.
    Escalate,
    /// A reload was requested; park the caller.
    Reload,
}

/// Wraps loaders so that stale-chunk failures trigger one reload per cooldown.
///
/// Cheap to clone; clones share capabilities and the name registry.
#[derive(Clone)]
pub struct ResilientLoader {
    store: Arc<dyn KeyValueStore>,
    reload: Arc<dyn ReloadTrigger>,
    clock: Arc<dyn Clock>,
    policy: Arc<RecoveryPolicy>,
    registered: Arc<DashMap<String, usize>>,
}

impl ResilientLoader {
    pub fn new(store: Arc<dyn KeyValueStore>, reload: Arc<dyn ReloadTrigger>) -> Self {
        Self {
            store,
            reload,
            clock: Arc::new(SystemClock),
            policy: Arc::new(RecoveryPolicy::default()),
            registered: Arc::new(DashMap::new()),
        }
    }

    /// Build from configuration. Uses a [`FileStore`] when a storage path is
    /// configured, otherwise an in-memory store.
    pub fn from_config(config: &LoaderConfig, reload: Arc<dyn ReloadTrigger>) -> Result<Self, StorageError> {
        let store: Arc<dyn KeyValueStore> = match &config.storage.path {
            Some(path) => Arc::new(FileStore::open(path)?),
            None => Arc::new(MemoryStore::new()),
        };
        Ok(Self::new(store, reload).with_policy(RecoveryPolicy::from(&config.recovery)))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_policy(mut self, policy: RecoveryPolicy) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// Wrap `loader` into a deferred unit.
    ///
    /// `name` keys the unit's recovery state and must be unique per distinct
    /// unit. Without one the unit falls back to a shared key, so every
    /// unnamed unit shares a single cooldown.
    pub fn wrap<F>(&self, loader: F, name: Option<&str>) -> LazyUnit<F> {
        let name = match name {
            Some(name) => name.to_string(),
            None => {
                tracing::warn!(
                    fallback = %self.policy.fallback_name,
                    "Unit wrapped without a name; it shares recovery state with every other unnamed unit"
                );
                self.policy.fallback_name.clone()
            }
        };
        let key = recovery_key(&self.policy.key_prefix, &name);

        let mut count = self.registered.entry(name.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            tracing::warn!(unit = %name, key = %key, "Unit name registered more than once; recovery state is shared");
        }
        drop(count);

        LazyUnit {
            name,
            key,
            loader,
            recovery: self.clone(),
        }
    }

    /// Names wrapped so far, with how many times each was registered.
    pub fn registered_units(&self) -> Vec<(String, usize)> {
        let mut units: Vec<_> = self
            .registered
            .iter()
            .map(|r| (r.key().clone(), *r.value()))
            .collect();
        units.sort();
        units
    }

    /// Decide what to do with a failed load and perform its side effects.
    pub fn handle_failure<E: fmt::Display + ?Sized>(&self, name: &str, key: &str, err: &E) -> RecoveryAction {
        let class = self.policy.classifier.classify(err);
        metrics::record_load_failure(name, class);

        if class == FailureClass::Other {
            tracing::error!(unit = %name, error = %err, "Failed to load unit");
            return RecoveryAction::Escalate;
        }

        let now = self.clock.now_millis();
        let state = RecoveryState::read(self.store.as_ref(), key);
        if !state.cooldown_expired(now, self.policy.cooldown) {
            tracing::error!(
                unit = %name,
                key = %key,
                elapsed_ms = ?state.elapsed(now),
                error = %err,
                "Chunk fetch failed again within reload cooldown; not reloading"
            );
            metrics::record_reload_suppressed(name, "cooldown");
            return RecoveryAction::Escalate;
        }

        let next = RecoveryState::reloaded_at(now);
        let value = next.encode().unwrap_or_default();
        if let Err(store_err) = self.store.set(key, value) {
            tracing::error!(
                unit = %name,
                key = %key,
                error = %err,
                store_error = %store_err,
                "Could not persist recovery state; not reloading"
            );
            metrics::record_reload_suppressed(name, "storage");
            return RecoveryAction::Escalate;
        }

        tracing::warn!(unit = %name, key = %key, error = %err, "Stale chunk detected, reloading environment");
        metrics::record_reload(name);
        self.reload.reload();
        RecoveryAction::Reload
    }
}

/// A deferred code unit produced by [`ResilientLoader::wrap`].
///
/// `load` resolves exactly like the wrapped loader, except that a stale chunk
/// outside its cooldown triggers a reload and never resolves.
pub struct LazyUnit<F> {
    name: String,
    key: String,
    loader: F,
    recovery: ResilientLoader,
}

impl<F> LazyUnit<F> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn recovery_key(&self) -> &str {
        &self.key
    }

    /// Invoke the loader once and apply the recovery rules to its failure.
    pub async fn load<Fut, M, E>(&self) -> Result<M, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<M, E>>,
        E: fmt::Display,
    {
        let err = match (self.loader)().await {
            Ok(module) => return Ok(module),
            Err(err) => err,
        };

        match self.recovery.handle_failure(&self.name, &self.key, &err) {
            RecoveryAction::Escalate => Err(err),
            RecoveryAction::Reload => stall::await_reload().await,
        }
    }
}

impl<F> fmt::Debug for LazyUnit<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyUnit")
            .field("name", &self.name)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
