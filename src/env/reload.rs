//! Environment reload primitive.

use tokio::sync::broadcast;

/// Discards and restarts the running process or view.
///
/// Implementations must not block; the loader calls this and then parks the
/// caller until the host replaces it.
pub trait ReloadTrigger: Send + Sync {
    fn reload(&self);
}

impl<F> ReloadTrigger for F
where
    F: Fn() + Send + Sync,
{
    fn reload(&self) {
        self()
    }
}

/// Reload requests delivered over a broadcast channel.
///
/// A host supervisor subscribes and performs the actual restart. Requests
/// sent while no one is subscribed are dropped.
pub struct ReloadSignal {
    tx: broadcast::Sender<()>,
}

impl ReloadSignal {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to reload requests.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Number of supervisors currently listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ReloadSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ReloadTrigger for ReloadSignal {
    fn reload(&self) {
        if self.tx.send(()).is_err() {
            tracing::warn!("Reload requested but no supervisor is listening");
        }
    }
}
