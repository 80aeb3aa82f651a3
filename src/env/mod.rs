//! Host environment capabilities.
//!
//! # Data Flow
//! ```text
//! ResilientLoader
//!     → storage.rs (read/write recovery timestamps per unit key)
//!     → clock.rs   (current time in epoch milliseconds)
//!     → reload.rs  (tear down and restart the running view)
//! ```
//!
//! # Design Decisions
//! - Every capability is injected, never a hidden global
//! - Storage lifetime belongs to the host; the loader never deletes keys
//! - Reload is fire-and-forget; callers do not wait on it

pub mod clock;
pub mod reload;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use reload::{ReloadSignal, ReloadTrigger};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
