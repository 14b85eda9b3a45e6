//! # jobvisor
//!
//! **jobvisor** is the job registry and event broker at the heart of a
//! multi-listener network server (mTLS, HTTP(S), DNS and operator RPC
//! listeners running side by side).
//!
//! It tracks every bound listener as a uniquely identified, independently
//! stoppable **job**, and relays typed lifecycle/system **events** to any
//! number of observers without coupling them to each other.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Listener   │   │   Listener   │   │   Listener   │
//!     │  (rpc, tcp)  │   │ (mtls, tcp)  │   │  (dns, udp)  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Server (control surface)                                         │
//! │  - JobRegistry (id → Job, one lock, sorted snapshots)             │
//! │  - Broker (per-subscriber bounded queues)                         │
//! │  - supervising task per job (TaskTracker)                         │
//! │  - subscriber workers (LogWriter, custom)                         │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │  supervisor  │   │  supervisor  │   │  supervisor  │   │
//!     │ (stop signal)│   │ (stop signal)│   │ (stop signal)│   │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘   │
//!      │ close → remove → publish JobStopped                   │
//!      ▼                  ▼                  ▼                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                Broker (try_send into each queue)                  │
//! └──────────┬──────────────────────┬──────────────────────┬──────────┘
//!            ▼                      ▼                      ▼
//!     Subscription #1        Subscription #2        SubscriberWorker
//!     (console view)         (audit)                 └─► Subscribe::on_event
//! ```
//!
//! ### Lifecycle
//! ```text
//! start_job(listener)
//!   ├─► bind            (Err → JobError::Bind, nothing registered)
//!   ├─► register Job    (id from the registry's allocator, never reused)
//!   ├─► publish JobStarted
//!   └─► spawn supervisor, return id
//!
//! stop_job(id) ──► fire stop signal once
//!   supervisor ──► close transport ──► remove from registry ──► publish JobStopped
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types                                  |
//! |-------------------|----------------------------------------------------------|--------------------------------------------|
//! | **Control**       | Start, stop, list jobs; shutdown with grace period.      | [`Server`], [`ServerBuilder`]              |
//! | **Jobs**          | Job metadata, stop signal, registry, console table.      | [`Job`], [`JobRegistry`], [`render_table`] |
//! | **Events**        | Typed events and non-blocking fan-out.                   | [`Event`], [`EventKind`], [`Broker`]       |
//! | **Listeners**     | Transport seam plus built-in TCP/UDP listeners.          | [`Listener`], [`TcpListenerJob`]           |
//! | **Subscribers**   | Worker-driven observers, built-in logger.                | [`Subscribe`], [`LogWriter`]               |
//! | **Errors**        | Typed errors for job control and shutdown.               | [`JobError`], [`RuntimeError`]             |
//! | **Configuration** | Grace period and subscriber queue size.                  | [`Config`]                                 |
//!
//! ## Example
//! ```rust
//! use jobvisor::{Config, EventKind, Server, TcpListenerJob};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::builder(Config::default()).build();
//!     let mut events = server.subscribe();
//!
//!     let id = server
//!         .start_job(TcpListenerJob::rpc("127.0.0.1", 0, |_stream, _peer| {}))
//!         .await?;
//!     assert_eq!(server.jobs().len(), 1);
//!
//!     server.stop_job(id)?;
//!     while let Some(ev) = events.recv().await {
//!         if ev.kind == EventKind::JobStopped {
//!             assert_eq!(ev.job().map(|j| j.id), Some(id));
//!             break;
//!         }
//!     }
//!     assert!(server.jobs().is_empty());
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod jobs;
mod listeners;
mod subscribers;

// ---- Public re-exports ----

pub use core::{Config, IdAllocator, Server, ServerBuilder};
pub use error::{JobError, RuntimeError};
pub use events::{
    Broker, Event, EventKind, OperatorRef, Payload, SessionRef, Subscription, SubscriptionId,
    MAX_CAPACITY,
};
pub use jobs::{render_table, Job, JobId, JobRegistry, JobSpec, Protocol, StopSignal};
pub use listeners::{AcceptLoop, Bound, Listener, TcpListenerJob, UdpListenerJob};
pub use subscribers::{LogWriter, Subscribe};
