//! Per-unit recovery state and the reload cooldown window.
//!
//! # State
//! One key per unit, holding the epoch-millisecond time of the last reload
//! triggered for that unit. Written only when a reload fires; never deleted
//! here.
//!
//! # Cooldown
//! ```text
//! absent                  → expired (first failure may reload)
//! now - last >  cooldown  → expired
//! now - last <= cooldown  → active (failure escalates)
//! ```

use std::time::Duration;

use crate::env::KeyValueStore;

/// Window during which at most one reload fires per unit.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(10);

/// Prefix prepended to the unit name to form its storage key.
pub const DEFAULT_KEY_PREFIX: &str = "retry-lazy-";

/// Name used when a unit is wrapped without one. Every unnamed unit shares it.
pub const FALLBACK_UNIT_NAME: &str = "component";

/// Storage key for a unit's recovery state.
pub fn recovery_key(prefix: &str, name: &str) -> String {
    format!("{}{}", prefix, name)
}

/// Persisted recovery state of one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecoveryState {
    /// Last reload time, epoch milliseconds.
    pub last_reload_at: Option<u64>,
}

impl RecoveryState {
    pub fn reloaded_at(millis: u64) -> Self {
        Self {
            last_reload_at: Some(millis),
        }
    }

    /// Decode a stored value. Garbage reads as absent.
    pub fn decode(raw: Option<&str>) -> Self {
        let last_reload_at = raw.and_then(|v| v.trim().parse::<u64>().ok());
        Self { last_reload_at }
    }

    /// Read the state stored under `key`.
    pub fn read(store: &dyn KeyValueStore, key: &str) -> Self {
        let raw = store.get(key);
        let state = Self::decode(raw.as_deref());
        if let (Some(value), None) = (raw.as_deref(), state.last_reload_at) {
            tracing::warn!(key = %key, value = %value, "Ignoring unparsable recovery timestamp");
        }
        state
    }

    pub fn encode(&self) -> Option<String> {
        self.last_reload_at.map(|at| at.to_string())
    }

    /// Milliseconds since the last reload. `None` if there never was one.
    pub fn elapsed(&self, now: u64) -> Option<u64> {
        self.last_reload_at.map(|at| now.saturating_sub(at))
    }

    /// Whether a new reload is allowed at `now`.
    pub fn cooldown_expired(&self, now: u64, cooldown: Duration) -> bool {
        let window = u64::try_from(cooldown.as_millis()).unwrap_or(u64::MAX);
        match self.elapsed(now) {
            None => true,
            Some(elapsed) => elapsed > window,
        }
    }
}
