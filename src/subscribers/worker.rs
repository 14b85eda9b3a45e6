//! # Subscriber worker: drains one subscription into one [`Subscribe`].
//!
//! ```text
//! Broker ──► [subscription queue] ──► worker ──► sub.on_event()
//!                                        └─────► panic → error! log, continue
//! ```
//!
//! On stop the worker delivers what was queued at that moment, then exits;
//! events published afterwards are left for the caller to discard when it
//! unsubscribes. The caller bounds the whole drain with a deadline.

use std::sync::Arc;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::panic_message;
use crate::events::{Broker, Event, Subscription, SubscriptionId};

use super::Subscribe;

/// A running subscriber worker.
pub(crate) struct SubscriberWorker {
    name: &'static str,
    subscription: SubscriptionId,
    stop: CancellationToken,
    join: JoinHandle<()>,
}

impl SubscriberWorker {
    /// Subscribes `sub` to `broker` and spawns its worker.
    pub(crate) fn spawn(broker: &Broker, sub: Arc<dyn Subscribe>) -> Self {
        let subscription = broker.subscribe_with_capacity(sub.queue_capacity());
        let id = subscription.id();
        let name = sub.name();
        let stop = CancellationToken::new();
        let join = tokio::spawn(run(sub, subscription, stop.clone()));

        Self {
            name,
            subscription: id,
            stop,
            join,
        }
    }

    /// Delivers pending events, stops the worker and unsubscribes it.
    ///
    /// A worker still busy at `deadline` is aborted. With no deadline the
    /// worker is aborted right away.
    pub(crate) async fn shutdown(self, broker: &Broker, deadline: Option<Instant>) {
        self.stop.cancel();
        let mut join = self.join;

        let finished = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, &mut join).await.ok(),
            None => None,
        };
        match finished {
            Some(Ok(())) => {}
            Some(Err(_)) => tracing::error!(subscriber = self.name, "subscriber worker aborted"),
            None => {
                join.abort();
                tracing::warn!(subscriber = self.name, "subscriber worker did not drain in time");
            }
        }
        broker.unsubscribe(self.subscription);
    }
}

async fn run(sub: Arc<dyn Subscribe>, mut subscription: Subscription, stop: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => {
                // Only what is queued now; publishers may keep going.
                for _ in 0..subscription.pending() {
                    match subscription.try_recv() {
                        Some(ev) => deliver(sub.as_ref(), &ev).await,
                        None => break,
                    }
                }
                break;
            }
            ev = subscription.recv() => match ev {
                Some(ev) => deliver(sub.as_ref(), &ev).await,
                None => break,
            },
        }
    }
}

async fn deliver(sub: &dyn Subscribe, ev: &Event) {
    let fut = sub.on_event(ev);
    if let Err(panic) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
        tracing::error!(
            subscriber = sub.name(),
            event = %ev.kind,
            panic = %panic_message(panic.as_ref()),
            "subscriber panicked"
        );
    }
}
