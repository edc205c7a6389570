//! Run-wide cancellation signal.
//!
//! One sender per run, any number of receivers. Once triggered the signal stays
//! triggered, so workers that subscribe late still observe it.
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct ShutdownSender {
    inner: watch::Sender<bool>,
}

#[derive(Debug, Clone)]
pub struct ShutdownReceiver {
    inner: watch::Receiver<bool>,
}

#[must_use]
pub fn shutdown_channel() -> (ShutdownSender, ShutdownReceiver) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender { inner: tx }, ShutdownReceiver { inner: rx })
}

impl ShutdownSender {
    /// Fires the signal. Repeated calls are no-ops.
    pub fn trigger(&self) {
        self.inner.send_replace(true);
    }

    #[must_use]
    pub fn subscribe(&self) -> ShutdownReceiver {
        ShutdownReceiver {
            inner: self.inner.subscribe(),
        }
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.inner.borrow()
    }
}

impl ShutdownReceiver {
    /// Receiver that never fires, for callers without a cancellation source.
    #[must_use]
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        Self { inner: rx }
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.inner.borrow()
    }

    /// Resolves once the signal fires. If every sender is gone without firing,
    /// the signal can no longer fire and this never resolves.
    pub async fn triggered(&mut self) {
        if self.inner.wait_for(|fired| *fired).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::time::Duration;

    fn run_async_test<F>(future: F) -> Result<(), String>
    where
        F: Future<Output = Result<(), String>>,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| format!("Failed to build runtime: {}", err))?;
        runtime.block_on(future)
    }

    #[test]
    fn late_subscriber_sees_trigger() -> Result<(), String> {
        run_async_test(async {
            let (tx, _rx) = shutdown_channel();
            tx.trigger();
            let mut late = tx.subscribe();
            if !late.is_triggered() {
                return Err("Expected late subscriber to observe trigger".to_owned());
            }
            tokio::time::timeout(Duration::from_millis(100), late.triggered())
                .await
                .map_err(|err| format!("triggered() did not resolve: {}", err))?;
            Ok(())
        })
    }

    #[test]
    fn never_receiver_does_not_fire() -> Result<(), String> {
        run_async_test(async {
            let mut rx = ShutdownReceiver::never();
            if rx.is_triggered() {
                return Err("never() receiver reported a trigger".to_owned());
            }
            let waited = tokio::time::timeout(Duration::from_millis(20), rx.triggered()).await;
            if waited.is_ok() {
                return Err("never() receiver resolved".to_owned());
            }
            Ok(())
        })
    }
}
