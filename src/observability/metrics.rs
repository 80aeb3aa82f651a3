//! Metrics collection.
//!
//! # Metrics
//! - `loader_failures_total` (counter): failed loads by unit and class
//! - `loader_reloads_total` (counter): reloads triggered by unit
//! - `loader_reloads_suppressed_total` (counter): stale chunks escalated instead
//!   of reloaded, by unit and reason (`cooldown`, `storage`)

use crate::resilience::classify::FailureClass;

pub fn record_load_failure(unit: &str, class: FailureClass) {
    ::metrics::counter!(
        "loader_failures_total",
        "unit" => unit.to_string(),
        "class" => class.as_str()
    )
    .increment(1);
}

pub fn record_reload(unit: &str) {
    ::metrics::counter!("loader_reloads_total", "unit" => unit.to_string()).increment(1);
}

pub fn record_reload_suppressed(unit: &str, reason: &'static str) {
    ::metrics::counter!(
        "loader_reloads_suppressed_total",
        "unit" => unit.to_string(),
        "reason" => reason
    )
    .increment(1);
}
