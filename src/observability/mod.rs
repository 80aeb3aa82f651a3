//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! resilience::loader produces:
//!     → logging.rs (structured log events: unit, key, error)
//!     → metrics.rs (failure, reload and suppression counters)
//! ```
//!
//! # Design Decisions
//! - Structured fields over formatted strings
//! - Metrics go through the `metrics` facade; without a recorder they are no-ops

pub mod logging;
pub mod metrics;
