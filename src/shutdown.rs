//! stop signal for the polling loop
//!
//! a thin wrapper over `tokio::sync::watch<bool>`. the handle side flips the
//! flag once; any number of tokens can observe it.

use tokio::sync::watch;

/// create a linked handle/token pair
pub fn channel() -> (ShutdownHandle, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx }, ShutdownToken { rx })
}

#[derive(Debug)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        // send_replace works even when every token is gone
        self.tx.send_replace(true);
    }
}

#[derive(Debug, Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// resolves once shutdown is triggered
    ///
    /// if the handle is dropped without triggering this pends forever.
    pub async fn wait(&mut self) {
        if self.rx.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_wakes_waiter() {
        let (handle, mut token) = channel();
        assert!(!token.is_triggered());

        let waiter = tokio::spawn(async move {
            token.wait().await;
            token.is_triggered()
        });
        handle.trigger();

        let woke = tokio::time::timeout(Duration::from_secs(2), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
        assert!(woke);
    }

    #[tokio::test]
    async fn test_trigger_before_wait() {
        let (handle, mut token) = channel();
        handle.trigger();
        tokio::time::timeout(Duration::from_millis(200), token.wait())
            .await
            .expect("already triggered");
    }

    #[tokio::test]
    async fn test_dropped_handle_never_fires() {
        let (handle, mut token) = channel();
        drop(handle);
        let waited = tokio::time::timeout(Duration::from_millis(50), token.wait()).await;
        assert!(waited.is_err());
        assert!(!token.is_triggered());
    }
}
