//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Load of a wrapped unit:
//!     → loader.rs (invoke the underlying loader)
//!     → On failure: classify.rs (stale chunk or anything else)
//!     → cooldown.rs (was this unit reloaded recently?)
//!     → stall.rs (park the caller while the environment reloads)
//! ```
//!
//! # Design Decisions
//! - One reload per unit per cooldown window; never a reload loop
//! - Escalated errors are the loader's own, unmodified
//! - Error wording is matched in exactly one place

pub mod classify;
pub mod cooldown;
pub mod loader;
pub mod stall;

pub use classify::{is_retryable_load_failure, FailureClass, FailureClassifier};
pub use cooldown::RecoveryState;
pub use loader::{LazyUnit, RecoveryAction, RecoveryPolicy, ResilientLoader};
