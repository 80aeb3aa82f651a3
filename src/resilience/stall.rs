//! Parking a caller while the host reloads.
//!
//! Once a reload has been requested the current process is about to be
//! replaced. The in-flight load neither succeeds nor fails: it waits on a
//! future that never completes, and is torn down with everything else. This
//! is intentional and not a leak; nothing else is held while parked.

/// Never resolves.
pub async fn await_reload<T>() -> T {
    tracing::debug!("Load parked until environment reload");
    std::future::pending::<T>().await
}
