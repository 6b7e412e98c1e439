//! Cooperative shutdown signaling
//!
//! A watch-channel based cancellation token threaded through every
//! potentially blocking operation: the long-poll receive, handler sends
//! and the supervisor's retry backoff. The token is checked at each
//! suspension point rather than polled as a global flag.

use tokio::sync::watch;

/// Create a connected shutdown handle/token pair.
pub fn channel() -> (ShutdownHandle, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx }, ShutdownToken { rx })
}

/// The requesting side of a shutdown signal.
#[derive(Debug)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    /// Request shutdown. All cloned tokens observe the signal.
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

/// The observing side of a shutdown signal.
///
/// Cheap to clone; every clone observes the same signal. Dropping the
/// [`ShutdownHandle`] counts as a shutdown request so detached tasks
/// cannot outlive the owner.
#[derive(Debug, Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    /// Non-blocking check whether shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is requested (or the handle is dropped).
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                // Sender dropped: treat as shutdown.
                return;
            }
        }
    }
}
