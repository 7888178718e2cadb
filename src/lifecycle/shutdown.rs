//! Shutdown coordination.

use tokio::sync::broadcast;

/// Broadcast-backed stop signal.
///
/// One of these exists for the process, and each scheduler generation
/// owns another so a reload can stop its probe tasks without touching
/// the rest of the process.
#[derive(Debug)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the stop signal. Must be called before `trigger`
    /// for the subscriber to see it.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the stop signal. Idempotent; subscribers that already
    /// stopped are fine.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_see_trigger() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        shutdown.trigger();
        assert!(rx.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_trigger_without_subscribers() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        // a late subscriber never sees the old signal
        let mut rx = shutdown.subscribe();
        assert!(rx.try_recv().is_err());
    }
}
