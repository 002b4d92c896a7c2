//! Ctrl+C handling: the first signal drains gracefully, the second aborts.

use std::future::Future;
use std::io;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Boxed future resolving when the next interrupt arrives.
pub type SignalFuture = Pin<Box<dyn Future<Output = io::Result<()>> + Send>>;

/// Cancels `cancel` on the first interrupt and returns `true` on the second.
///
/// Returns `false` if the signal source fails, e.g. no handler can be installed.
pub async fn forward_interrupts<F>(mut next_signal: F, cancel: CancellationToken) -> bool
where
    F: FnMut() -> SignalFuture,
{
    if next_signal().await.is_err() {
        return false;
    }
    warn!("Ctrl+C received; finishing the current batch (press again to abort)");
    cancel.cancel();

    if next_signal().await.is_err() {
        return false;
    }
    warn!("second Ctrl+C; aborting");
    true
}

/// Interrupts from the terminal.
pub fn ctrl_c() -> SignalFuture {
    Box::pin(tokio::signal::ctrl_c())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Notify;

    fn fake_signals(notify: Arc<Notify>) -> impl FnMut() -> SignalFuture {
        move || {
            let n = notify.clone();
            Box::pin(async move {
                n.notified().await;
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn first_signal_cancels_second_forces_exit() {
        let notify = Arc::new(Notify::new());
        let token = CancellationToken::new();
        let task = tokio::spawn(forward_interrupts(fake_signals(notify.clone()), token.clone()));

        notify.notify_one();
        token.cancelled().await;
        tokio::task::yield_now().await;
        assert!(!task.is_finished());

        notify.notify_one();
        assert!(task.await.unwrap());
    }

    #[tokio::test]
    async fn failing_signal_source_leaves_token_alone() {
        let token = CancellationToken::new();
        let failing = || -> SignalFuture { Box::pin(async { Err(io::Error::other("no handler")) }) };

        assert!(!forward_interrupts(failing, token.clone()).await);
        assert!(!token.is_cancelled());
    }
}
