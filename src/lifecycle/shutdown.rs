//! Broadcast used to stop the server task.

use tokio::sync::broadcast;

/// Fan-out shutdown notification.
///
/// Subscribers receive `()` once `trigger` is called. A receiver that
/// subscribes after the trigger sees a closed or empty channel, so subscribe
/// before starting the task that waits on it.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Notify every subscriber. Returns how many were listening.
    pub fn trigger(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
