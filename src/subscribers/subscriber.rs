//! # Event subscriber trait.
//!
//! Provides [`Subscribe`] an extension point for plugging observers (console
//! live view, audit log, config persistence) into the server.
//!
//! Each subscriber gets:
//! - **Its own broker subscription** (capacity via [`Subscribe::queue_capacity`])
//! - **Dedicated worker task** draining that subscription
//! - **Panic isolation** (panics are caught and logged; the worker keeps going)
//!
//! ## Rules
//! - A slow subscriber only fills its own queue; overflow drops events for
//!   it alone.
//! - Events are processed sequentially (FIFO) per subscriber.
//! - Subscribers never block publishers or each other.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use jobvisor::{Event, EventKind, Subscribe};
//!
//! struct Audit;
//!
//! #[async_trait]
//! impl Subscribe for Audit {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::JobStarted | EventKind::JobStopped) {
//!             // append to the audit trail
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "audit" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Observer of relayed events, driven by a dedicated worker.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called from the subscriber's worker task, never from the publisher.
    async fn on_event(&self, event: &Event);

    /// Name used in logs. Prefer short names ("console", "audit").
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue capacity for this subscriber's subscription (clamped to ≥1).
    ///
    /// Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
