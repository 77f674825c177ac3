// Application state module
// Process-wide state shared read-only by every connection

use tokio::sync::watch;

use super::types::Config;

/// Application state
///
/// Built once at startup. Holds configuration and the shutdown flag only,
/// never per-request data.
pub struct AppState {
    pub config: Config,
    shutdown: watch::Sender<bool>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self { config, shutdown }
    }

    /// Ask the accept loop and open connections to stop. Idempotent.
    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}

/// Resolve once shutdown has been requested, including before the call.
pub async fn shutdown_requested(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            // Sender gone: no shutdown can arrive any more
            std::future::pending::<()>().await;
        }
    }
}
