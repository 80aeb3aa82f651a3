//! Operator maintenance of persisted recovery state.
//!
//! # Responsibilities
//! - Locate the state file from flags or config
//! - Report each unit's last reload and whether it is cooling down
//! - Reset state for one unit or for the whole file
//!
//! # Design Decisions
//! - Clearing everything never parses the old file, so a damaged file can
//!   always be reset

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::LoaderConfig;
use crate::env::{FileStore, StorageError};
use crate::resilience::classify::FailureClass;
use crate::resilience::cooldown::{recovery_key, RecoveryState};
use crate::resilience::RecoveryPolicy;

/// State file to operate on: an explicit path wins over `storage.path`.
pub fn resolve_store_path(override_path: Option<&Path>, config: &LoaderConfig) -> Option<PathBuf> {
    override_path
        .map(Path::to_path_buf)
        .or_else(|| config.storage.path.as_ref().map(PathBuf::from))
}

/// One persisted entry as seen at inspection time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryStatus {
    pub key: String,
    pub value: String,
    /// `None` when the stored value does not parse.
    pub age_ms: Option<u64>,
    pub cooling_down: bool,
}

pub fn inspect_entries(
    entries: &BTreeMap<String, String>,
    policy: &RecoveryPolicy,
    now: u64,
) -> Vec<EntryStatus> {
    entries
        .iter()
        .map(|(key, value)| {
            let state = RecoveryState::decode(Some(value.as_str()));
            EntryStatus {
                key: key.clone(),
                value: value.clone(),
                age_ms: state.elapsed(now),
                cooling_down: !state.cooldown_expired(now, policy.cooldown),
            }
        })
        .collect()
}

/// Result of classifying a message against the active patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifyReport {
    pub class: FailureClass,
    pub matched: Option<String>,
    pub patterns: Vec<String>,
}

pub fn classify_message(policy: &RecoveryPolicy, message: &str) -> ClassifyReport {
    let classifier = &policy.classifier;
    ClassifyReport {
        class: classifier.classify(message),
        matched: classifier.matching_pattern(message).map(str::to_string),
        patterns: classifier.patterns().to_vec(),
    }
}

/// What a clear request did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearOutcome {
    /// The whole file was reset.
    All,
    /// The unit's key was removed.
    Unit { key: String },
    /// The unit had no state.
    NoState { key: String },
}

pub fn clear_state(path: &Path, unit: Option<&str>, policy: &RecoveryPolicy) -> Result<ClearOutcome, StorageError> {
    match unit {
        None => {
            FileStore::reset(path)?;
            tracing::info!(path = ?path, "Recovery state reset");
            Ok(ClearOutcome::All)
        }
        Some(unit) => {
            let key = recovery_key(&policy.key_prefix, unit);
            if FileStore::open(path)?.remove(&key)? {
                tracing::info!(key = %key, "Recovery state cleared");
                Ok(ClearOutcome::Unit { key })
            } else {
                Ok(ClearOutcome::NoState { key })
            }
        }
    }
}
