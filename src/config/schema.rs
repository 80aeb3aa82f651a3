//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::resilience::classify::CHUNK_FETCH_PATTERNS;
use crate::resilience::cooldown::{DEFAULT_COOLDOWN, DEFAULT_KEY_PREFIX, FALLBACK_UNIT_NAME};

/// Root configuration for the loader.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LoaderConfig {
    /// Reload recovery settings.
    pub recovery: RecoveryConfig,

    /// Where recovery state is kept.
    pub storage: StorageConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Reload recovery configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Cooldown window in milliseconds. At most one reload per unit inside it.
    pub cooldown_ms: u64,

    /// Prefix of the per-unit storage key.
    pub key_prefix: String,

    /// Unit name used when a unit is wrapped without one.
    pub fallback_name: String,

    /// Error message substrings that identify a stale chunk.
    pub chunk_error_patterns: Vec<String>,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: DEFAULT_COOLDOWN.as_millis() as u64,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            fallback_name: FALLBACK_UNIT_NAME.to_string(),
            chunk_error_patterns: CHUNK_FETCH_PATTERNS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Recovery state storage.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file backing the store. In-memory when unset.
    pub path: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
