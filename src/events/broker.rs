//! # Event broker: non-blocking fan-out to a changing set of subscribers.
//!
//! [`Broker`] keeps one bounded [`tokio::sync::mpsc`] queue per subscription.
//! `publish` pushes an `Arc<Event>` into every queue with `try_send`, so a
//! slow or abandoned subscriber can never stall the publisher.
//!
//! ## Architecture
//! ```text
//! publish(event)
//!     │            (one lock held for the whole fan-out)
//!     ├──► [queue #1] ──► Subscription #1 .recv()
//!     │    (bounded)        full → dropped += 1
//!     ├──► [queue #2] ──► Subscription #2 .recv()
//!     │    (bounded)        receiver gone → pruned
//!     └──► [queue #N] ──► Subscription #N .recv()
//! ```
//!
//! ## Rules
//! - **Non-blocking**: `subscribe`, `unsubscribe` and `publish` never await.
//! - **Per-subscriber FIFO**: fan-out happens under the table lock, so two
//!   publishes reach every queue in the same order.
//! - **No cross-subscriber ordering** of *consumption*.
//! - **Overflow**: the event is dropped for that subscriber only and counted;
//!   nothing is logged per drop.
//! - **Unsubscribe**: no delivery after it returns; events still queued are
//!   discarded and `recv()` returns `None`.
//! - **No history**: a subscription only sees events published after it
//!   was created.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, Semaphore};

use crate::core::IdAllocator;

use super::event::Event;

/// Subscription identifier, unique per broker.
pub type SubscriptionId = u32;

/// Largest queue a subscription can get; tokio's bounded channel caps
/// capacity at the semaphore permit limit.
pub const MAX_CAPACITY: usize = Semaphore::MAX_PERMITS;

#[inline]
fn clamp_capacity(capacity: usize) -> usize {
    capacity.clamp(1, MAX_CAPACITY)
}

/// State shared between the broker's sink and the subscriber's handle.
#[derive(Debug, Default)]
struct Shared {
    dropped: AtomicU64,
    closed: AtomicBool,
}

/// Broker side of one subscription.
struct Sink {
    tx: mpsc::Sender<Arc<Event>>,
    shared: Arc<Shared>,
}

/// Publish/subscribe hub relaying typed events to live subscribers.
pub struct Broker {
    sinks: Mutex<HashMap<SubscriptionId, Sink>>,
    ids: IdAllocator,
    capacity: usize,
}

impl Broker {
    /// Creates a broker whose subscriptions buffer up to `capacity` events
    /// each (clamped to `1..=MAX_CAPACITY`).
    pub fn new(capacity: usize) -> Self {
        Self {
            sinks: Mutex::new(HashMap::new()),
            ids: IdAllocator::new(),
            capacity: clamp_capacity(capacity),
        }
    }

    /// Default per-subscription capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Registers a new subscription with the default capacity.
    pub fn subscribe(&self) -> Subscription {
        self.subscribe_with_capacity(self.capacity)
    }

    /// Registers a new subscription buffering up to `capacity` events
    /// (clamped to `1..=MAX_CAPACITY`).
    pub fn subscribe_with_capacity(&self, capacity: usize) -> Subscription {
        let capacity = clamp_capacity(capacity);
        let (tx, rx) = mpsc::channel(capacity);
        let shared = Arc::new(Shared::default());
        let id = self.ids.next();

        self.lock().insert(
            id,
            Sink {
                tx,
                shared: Arc::clone(&shared),
            },
        );
        tracing::debug!(subscription = id, capacity, "subscribed");

        Subscription { id, rx, shared }
    }

    /// Deregisters a subscription.
    ///
    /// Returns `false` if `id` was not subscribed (already unsubscribed or
    /// pruned). The matching [`Subscription::recv`] returns `None` from now on.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let sink = self.lock().remove(&id);
        match sink {
            Some(sink) => {
                sink.shared.closed.store(true, Ordering::Release);
                tracing::debug!(subscription = id, "unsubscribed");
                true
            }
            None => false,
        }
    }

    /// Hands `event` to every current subscription; returns how many queues
    /// accepted it.
    pub fn publish(&self, event: Event) -> usize {
        self.publish_arc(Arc::new(event))
    }

    /// Like [`publish`](Self::publish) for an already shared event.
    pub fn publish_arc(&self, event: Arc<Event>) -> usize {
        let mut delivered = 0;
        self.lock().retain(|id, sink| {
            match sink.tx.try_send(Arc::clone(&event)) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    sink.shared.dropped.fetch_add(1, Ordering::Relaxed);
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    // Handle dropped without unsubscribing.
                    sink.shared.closed.store(true, Ordering::Release);
                    tracing::debug!(subscription = *id, "pruned abandoned subscription");
                    false
                }
            }
        });
        delivered
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Events dropped so far for subscription `id` because its queue was full.
    pub fn dropped(&self, id: SubscriptionId) -> Option<u64> {
        self.lock()
            .get(&id)
            .map(|s| s.shared.dropped.load(Ordering::Relaxed))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SubscriptionId, Sink>> {
        self.sinks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new(crate::Config::default().subscriber_capacity)
    }
}

impl std::fmt::Debug for Broker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broker")
            .field("subscribers", &self.subscriber_count())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Subscriber side of a registration: drain it to receive events.
///
/// Dropping a subscription without calling [`Broker::unsubscribe`] is fine;
/// the broker prunes it on the next publish.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    rx: mpsc::Receiver<Arc<Event>>,
    shared: Arc<Shared>,
}

impl Subscription {
    /// Identifier to pass to [`Broker::unsubscribe`].
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Waits for the next event.
    ///
    /// Returns `None` once the subscription is closed (unsubscribed, or the
    /// broker was dropped); events still queued at that point are discarded.
    pub async fn recv(&mut self) -> Option<Arc<Event>> {
        if self.is_closed() {
            return None;
        }
        let ev = self.rx.recv().await?;
        if self.is_closed() {
            return None;
        }
        Some(ev)
    }

    /// Returns the next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<Event>> {
        if self.is_closed() {
            return None;
        }
        self.rx.try_recv().ok()
    }

    /// Number of events currently queued (`0` once closed).
    pub fn pending(&self) -> usize {
        if self.is_closed() {
            0
        } else {
            self.rx.len()
        }
    }

    /// Events dropped for this subscription because its queue was full.
    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    /// True once the broker has deregistered this subscription.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }
}
