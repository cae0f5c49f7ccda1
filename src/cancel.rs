//! Cooperative cancellation for collection calls.
//!
//! A `CancelToken` is cloned into every component that suspends. Cancelling
//! any clone wakes every pending wait, so rate-limit sleeps, retry backoff and
//! in-flight requests all return `Error::Cancelled` promptly.

use crate::error::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// A cancellation token shared across the tasks of a collection call.
///
/// # Example
///
/// ```
/// use github_collector::CancelToken;
///
/// let token = CancelToken::new();
/// let clone = token.clone();
///
/// clone.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    /// Create a token that has not been cancelled.
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Request cancellation. All clones observe it.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Cancel automatically once `deadline` has elapsed.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn cancel_after(&self, deadline: Duration) {
        let token = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            token.cancel();
        });
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Return `Error::Cancelled` if cancellation has been requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolve once the token is cancelled.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives as long as `self`, so this only resolves on cancel.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }

    /// Drive `fut` to completion unless the token is cancelled first.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output> {
        tokio::select! {
            biased;
            () = self.cancelled() => Err(Error::Cancelled),
            output = fut => Ok(output),
        }
    }

    /// Sleep for `duration`, returning early with `Error::Cancelled` on cancel.
    pub async fn sleep(&self, duration: Duration) -> Result<()> {
        self.run(tokio::time::sleep(duration)).await
    }
}
