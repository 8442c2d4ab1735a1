//! Graceful shutdown for the server loop.
//!
//! One broadcast channel fans a single stop notice out to the accept loop.
//! The notice comes from an OS signal in production and from `trigger` in
//! tests.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::lifecycle::signals;

/// Shutdown handle. Clones share the same channel.
#[derive(Clone)]
pub struct Shutdown {
    notice: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (notice, _) = broadcast::channel(1);
        Self { notice }
    }

    /// A receiver for `HttpServer::run`.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.notice.subscribe()
    }

    /// Stop the server now. Returns how many listeners were told.
    pub fn trigger(&self) -> usize {
        self.notice.send(()).unwrap_or(0)
    }

    /// Trigger once SIGINT or SIGTERM arrives.
    pub fn on_termination_signal(&self) -> JoinHandle<()> {
        let shutdown = self.clone();
        tokio::spawn(async move {
            signals::wait_for_termination().await;
            let notified = shutdown.trigger();
            tracing::info!(listeners = notified, "Draining in-flight requests");
        })
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
