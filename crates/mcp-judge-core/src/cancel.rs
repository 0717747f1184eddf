//! Cooperative cancellation for in-flight evaluations.

use std::sync::Arc;
use tokio::sync::watch;

/// A cloneable cancellation flag.
///
/// All clones observe the same flag. Once cancelled it stays cancelled.
#[derive(Debug, Clone)]
pub struct Cancellation {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

impl Cancellation {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Request cancellation. Safe to call from any thread, including a
    /// signal handler thread.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolve once cancellation has been requested
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        // The sender lives as long as `self`, so this only errors on teardown
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancel_wakes_waiters() {
        let cancellation = Cancellation::new();
        let waiter = cancellation.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });

        assert!(!cancellation.is_cancelled());
        cancellation.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(cancellation.is_cancelled());
    }

    #[tokio::test]
    async fn test_already_cancelled_resolves_immediately() {
        let cancellation = Cancellation::new();
        cancellation.cancel();
        tokio::time::timeout(Duration::from_millis(100), cancellation.cancelled())
            .await
            .unwrap();
    }
}
