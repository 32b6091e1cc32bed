pub use self::error::Error;
pub use self::session::Session;
pub use self::tracker::{Tracker, TrackerStats};

mod error;
mod session;
mod tracker;

pub type Result<T = ()> = std::result::Result<T, error::Error>;

/// Cancellation token.
///
/// Cloned handles observe the same token. Once triggered a token stays
/// triggered.
#[derive(Clone)]
pub struct Shutdown {
    sender: std::sync::Arc<tokio::sync::watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self {
            sender: std::sync::Arc::new(tokio::sync::watch::channel(false).0),
        }
    }

    /// Request shutdown.
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    #[inline]
    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }

    /// Wait until shutdown is requested.
    pub async fn wait(&self) {
        let mut receiver = self.sender.subscribe();

        // The sender lives as long as self, so this cannot fail.
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }

    /// Trigger the token on Ctrl-C.
    pub fn trigger_on_ctrl_c(&self) {
        let shutdown = self.clone();

        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for termination signal: {}", e);
                return;
            }

            log::info!("Termination requested");

            shutdown.trigger();
        });
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
