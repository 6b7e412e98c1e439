//! Polling supervisor
//!
//! The outermost safety net of the long-running process: asks the
//! transport to block until updates arrive, and on any failure logs it
//! and backs off for a fixed delay before trying again. There is no retry
//! cap; the loop only ends on shutdown. Pending updates are discarded by
//! the transport on every (re)start, so nothing is replayed after a
//! crash.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::telegram::api::{TelegramApi, UpdateHandler};
use crate::utils::shutdown::ShutdownToken;

/// Delay between receive attempts after a failure.
pub const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Resilient receive loop over a [`TelegramApi`] transport.
pub struct PollingSupervisor {
    api: Arc<dyn TelegramApi>,
    handler: Arc<dyn UpdateHandler>,
    retry_delay: Duration,
}

impl PollingSupervisor {
    pub fn new(api: Arc<dyn TelegramApi>, handler: Arc<dyn UpdateHandler>) -> Self {
        Self::with_retry_delay(api, handler, RETRY_DELAY)
    }

    pub fn with_retry_delay(
        api: Arc<dyn TelegramApi>,
        handler: Arc<dyn UpdateHandler>,
        retry_delay: Duration,
    ) -> Self {
        Self {
            api,
            handler,
            retry_delay,
        }
    }

    /// Run until shutdown is requested.
    ///
    /// A clean (`Ok`) return from the transport means cancellation was
    /// observed; an `Err` is logged and retried after the fixed delay.
    /// Cancellation during the backoff exits immediately.
    pub async fn run(&self, shutdown: ShutdownToken) {
        info!("Starting polling supervisor");

        while !shutdown.is_shutdown() {
            match self
                .api
                .receive(self.handler.clone(), shutdown.clone())
                .await
            {
                Ok(()) => {
                    // Clean return; the loop condition decides whether to
                    // go around again.
                }
                Err(err) => {
                    error!(error = %err, "Polling failed, retrying after {:?}", self.retry_delay);
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.retry_delay) => {}
                    }
                }
            }
        }

        info!("Polling supervisor stopped");
    }
}
