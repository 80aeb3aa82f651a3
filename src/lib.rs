//! Resilient dynamic-module loader.
//!
//! Wraps an on-demand "fetch code unit" operation. When the fetch fails
//! because a deployment invalidated the chunk, the environment is reloaded
//! once; a failure that recurs inside the cooldown window is handed back to
//! the caller instead, so a permanently missing chunk never loops.
//!
//! ```text
//!   caller ──▶ LazyUnit::load ──▶ loader() ──▶ Ok(module)
//!                   │
//!                   └─ Err ─▶ classify ─▶ cooldown ─▶ reload + park
//!                                   │            │
//!                                   └────────────┴─▶ Err(unchanged)
//! ```

pub mod admin;
pub mod config;
pub mod env;
pub mod observability;
pub mod resilience;

pub use config::LoaderConfig;
pub use env::{KeyValueStore, ReloadTrigger};
pub use resilience::{is_retryable_load_failure, LazyUnit, ResilientLoader};
