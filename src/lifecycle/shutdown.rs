//! Shutdown coordination.
//!
//! One `Shutdown` is created by the binary. The HTTP server and the health
//! monitor each hold a receiver; a single `trigger` stops both.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

#[derive(Debug)]
pub struct Shutdown {
    notify: broadcast::Sender<()>,
    fired: AtomicBool,
}

impl Shutdown {
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(1);
        Self {
            notify,
            fired: AtomicBool::new(false),
        }
    }

    /// Receiver that completes once shutdown is triggered.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.notify.subscribe()
    }

    /// Request shutdown. Only the first call notifies listeners.
    pub fn trigger(&self) {
        if self.fired.swap(true, Ordering::AcqRel) {
            return;
        }
        let listeners = self.notify.send(()).unwrap_or(0);
        tracing::info!(listeners, "Shutdown requested");
    }

    pub fn is_triggered(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Tasks still holding a receiver.
    pub fn receiver_count(&self) -> usize {
        self.notify.receiver_count()
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
    async fn every_subscriber_sees_trigger() {
        let shutdown = Shutdown::new();
        let mut server = shutdown.subscribe();
        let mut monitor = server.resubscribe();
        assert_eq!(shutdown.receiver_count(), 2);

        shutdown.trigger();
        assert!(shutdown.is_triggered());
        assert!(server.recv().await.is_ok());
        assert!(monitor.recv().await.is_ok());
    }

    #[test]
    fn trigger_without_listeners_is_harmless() {
        let shutdown = Shutdown::default();
        shutdown.trigger();
        shutdown.trigger();
        assert!(shutdown.is_triggered());
    }
}
