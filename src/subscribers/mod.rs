//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the worker that drives a
//! subscriber from its broker subscription, and the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Server::publish / job lifecycle ──► Broker ──┬──► Subscription (drained by caller)
//!                                              │
//!                                              └──► SubscriberWorker ──► Subscribe::on_event
//!                                                         ├──► LogWriter
//!                                                         └──► custom (console, audit, ...)
//! ```

mod log;
mod subscriber;
mod worker;

pub use log::LogWriter;
pub use subscriber::Subscribe;
pub(crate) use worker::SubscriberWorker;
