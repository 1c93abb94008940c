//! Signal handling for graceful shutdown.
//!
//! `ShutdownFlag` is set by Ctrl+C. Synchronous code polls `should_stop`,
//! async code awaits `wait`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Flag that tracks whether shutdown has been requested.
#[derive(Debug, Clone)]
pub struct ShutdownFlag {
    flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl Default for ShutdownFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownFlag {
    /// Create a new shutdown flag and register the Ctrl+C handler.
    ///
    /// If the handler cannot be registered (e.g. already registered), the
    /// flag is still valid and can be triggered manually.
    pub fn new() -> Self {
        let shutdown = Self::manual();
        let handler = shutdown.clone();

        // May fail if a handler is already set
        let _ = ctrlc::set_handler(move || handler.trigger());

        shutdown
    }

    /// Create a shutdown flag without registering a handler.
    pub fn manual() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Request shutdown and wake every waiter.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn should_stop(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Resolve once shutdown has been requested.
    pub async fn wait(&self) {
        loop {
            // Register before checking so a trigger in between is not lost
            let notified = self.notify.notified();
            if self.should_stop() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_shutdown_flag_initially_false() {
        let flag = ShutdownFlag::manual();
        assert!(!flag.should_stop());
    }

    #[test]
    fn test_shutdown_flag_clone_shares_state() {
        let flag1 = ShutdownFlag::manual();
        let flag2 = flag1.clone();
        flag1.trigger();
        assert!(flag2.should_stop());
    }

    #[tokio::test]
    async fn test_wait_returns_when_already_triggered() {
        let flag = ShutdownFlag::manual();
        flag.trigger();

        tokio::time::timeout(Duration::from_secs(1), flag.wait())
            .await
            .expect("wait should return immediately");
    }

    #[tokio::test]
    async fn test_wait_wakes_on_trigger() {
        let flag = ShutdownFlag::manual();
        let waiter = flag.clone();
        let handle = tokio::spawn(async move { waiter.wait().await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        flag.trigger();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_pending_without_trigger() {
        let flag = ShutdownFlag::manual();
        let result = tokio::time::timeout(Duration::from_millis(20), flag.wait()).await;
        assert!(result.is_err());
    }
}
