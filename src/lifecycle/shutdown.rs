//! Stop signal shared by the listener and the signal task.
//!
//! The signal handler holds one clone and fires it once; the HTTP server
//! holds a receiver and starts draining when it resolves.

use tokio::sync::broadcast;

/// Cloneable handle that tells the gateway to stop accepting connections.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver handed to `HttpServer::run`.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Ask every receiver to stop. Firing before anyone listens does nothing.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
