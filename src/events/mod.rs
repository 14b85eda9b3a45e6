//! Events: types and the publish/subscribe broker.
//!
//! This module groups the event **data model** and the **broker** used to
//! relay lifecycle and system events to any number of observers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`], [`Payload`] event classification and payload
//! - [`Broker`], [`Subscription`] per-subscriber bounded fan-out
//!
//! ## Quick reference
//! - **Publishers**: `Server` (job started/stopped) and external
//!   collaborators (sessions, beacons, operators) via `Server::publish`.
//! - **Consumers**: [`Subscription`] drain loops and [`Subscribe`](crate::Subscribe)
//!   workers attached by the server.

mod broker;
mod event;

pub use broker::{Broker, Subscription, SubscriptionId, MAX_CAPACITY};
pub use event::{Event, EventKind, OperatorRef, Payload, SessionRef};
