//! Cancellable background loop shared by the built-in listeners.
//!
//! Custom [`Listener`](crate::Listener) implementations can use it too:
//! spawn the loop in `bind`, return the [`AcceptLoop`] as the handle, and
//! [`stop`](AcceptLoop::stop) it in `close`.

use std::future::Future;
use std::time::Duration;

use anyhow::anyhow;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Pause after a failed `accept`/`recv_from` (e.g. file descriptor exhaustion).
pub(super) const ERROR_PAUSE: Duration = Duration::from_millis(100);

/// Handle to a running accept/receive loop.
///
/// The loop owns the bound socket; stopping the loop drops it, which closes
/// the listening endpoint.
///
/// ## Example
/// ```
/// use jobvisor::AcceptLoop;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> anyhow::Result<()> {
/// let handle = AcceptLoop::spawn(|cancel| async move {
///     cancel.cancelled().await;
/// });
/// handle.stop().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AcceptLoop {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl AcceptLoop {
    /// Spawns `body` with a fresh cancellation token.
    ///
    /// `body` must return once the token is cancelled.
    pub fn spawn<F, Fut>(body: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let join = tokio::spawn(body(cancel.clone()));
        Self { cancel, join }
    }

    /// Cancels the loop and waits for it to release its socket.
    pub async fn stop(self) -> anyhow::Result<()> {
        self.cancel.cancel();
        self.join
            .await
            .map_err(|e| anyhow!("listener loop terminated abnormally: {e}"))
    }
}

/// Sleeps [`ERROR_PAUSE`] after a socket error, returning early on cancel.
pub(super) async fn pause_after_error(cancel: &CancellationToken) {
    tokio::select! {
        _ = cancel.cancelled() => {}
        _ = tokio::time::sleep(ERROR_PAUSE) => {}
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    use super::*;

    #[tokio::test]
    async fn stop_waits_for_the_loop_to_exit() {
        let turns = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&turns);
        let handle = AcceptLoop::spawn(move |cancel| async move {
            while !cancel.is_cancelled() {
                seen.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
            }
        });

        tokio::task::yield_now().await;
        handle.stop().await.unwrap();
        let after = turns.load(Ordering::SeqCst);
        tokio::task::yield_now().await;
        assert_eq!(turns.load(Ordering::SeqCst), after, "loop kept running after stop");
    }

    #[tokio::test]
    async fn panicking_loop_reports_an_error() {
        let handle = AcceptLoop::spawn(|_cancel| async move { panic!("socket gone") });
        let err = handle.stop().await.unwrap_err();
        assert!(err.to_string().contains("terminated abnormally"));
    }

    #[tokio::test]
    async fn error_pause_throttles_and_yields_to_cancel() {
        let cancel = CancellationToken::new();
        let started = Instant::now();
        pause_after_error(&cancel).await;
        assert!(started.elapsed() >= ERROR_PAUSE);

        cancel.cancel();
        let started = Instant::now();
        pause_after_error(&cancel).await;
        assert!(started.elapsed() < ERROR_PAUSE);
    }
}
