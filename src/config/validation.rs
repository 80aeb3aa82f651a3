//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (cooldown > 0)
//! - Reject patterns that would match every message
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: LoaderConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::LoaderConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("recovery.cooldown_ms must be greater than zero")]
    ZeroCooldown,

    #[error("recovery.key_prefix must not be empty")]
    EmptyKeyPrefix,

    #[error("recovery.fallback_name must not be empty")]
    EmptyFallbackName,

    #[error("recovery.chunk_error_patterns must list at least one pattern")]
    NoPatterns,

    #[error("recovery.chunk_error_patterns[{0}] is empty and would match every error")]
    EmptyPattern(usize),

    #[error("observability.log_level {0:?} is not one of trace, debug, info, warn, error")]
    UnknownLogLevel(String),
}

pub fn validate_config(config: &LoaderConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let recovery = &config.recovery;

    if recovery.cooldown_ms == 0 {
        errors.push(ValidationError::ZeroCooldown);
    }
    if recovery.key_prefix.is_empty() {
        errors.push(ValidationError::EmptyKeyPrefix);
    }
    if recovery.fallback_name.is_empty() {
        errors.push(ValidationError::EmptyFallbackName);
    }
    if recovery.chunk_error_patterns.is_empty() {
        errors.push(ValidationError::NoPatterns);
    }
    for (i, pattern) in recovery.chunk_error_patterns.iter().enumerate() {
        if pattern.is_empty() {
            errors.push(ValidationError::EmptyPattern(i));
        }
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&LoaderConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = LoaderConfig::default();
        config.recovery.cooldown_ms = 0;
        config.recovery.fallback_name.clear();
        config.recovery.chunk_error_patterns = vec!["ok".into(), String::new()];
        config.observability.log_level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::ZeroCooldown,
                ValidationError::EmptyFallbackName,
                ValidationError::EmptyPattern(1),
                ValidationError::UnknownLogLevel("loud".into()),
            ]
        );
    }

    #[test]
    fn test_no_patterns() {
        let mut config = LoaderConfig::default();
        config.recovery.chunk_error_patterns.clear();
        assert_eq!(validate_config(&config).unwrap_err(), vec![ValidationError::NoPatterns]);
    }

    #[test]
    fn test_log_level_case_insensitive() {
        let mut config = LoaderConfig::default();
        config.observability.log_level = "WARN".into();
        assert!(validate_config(&config).is_ok());
    }
}
