//! # Lifecycle and system events relayed by the broker.
//!
//! The [`EventKind`] enum classifies events across two groups:
//! - **Job events**: emitted by the server itself (`JobStarted`, `JobStopped`)
//! - **Collaborator events**: published by session tracking, multiplayer and
//!   beacon handling through the same broker (`SessionConnected`,
//!   `OperatorJoined`, ...), plus [`EventKind::Other`] for kinds this crate
//!   never names.
//!
//! The [`Event`] struct carries an optional [`Payload`] (the job, session or
//! operator concerned), an optional reason, and a wall-clock timestamp.
//! Events are immutable once published; subscribers receive `Arc<Event>`.
//!
//! ## Example
//! ```rust
//! use jobvisor::{Event, EventKind, SessionRef};
//!
//! let ev = Event::new(EventKind::SessionConnected)
//!     .with_session(SessionRef::new("4f2a", "QUIET_FALCON"))
//!     .with_reason("mtls");
//!
//! assert_eq!(ev.kind, EventKind::SessionConnected);
//! assert_eq!(ev.session().map(|s| s.name.as_ref()), Some("QUIET_FALCON"));
//! assert_eq!(ev.reason.as_deref(), Some("mtls"));
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use crate::jobs::Job;

/// Classification of relayed events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Job events (emitted by the server) ===
    /// A listener was bound and its job registered.
    ///
    /// Sets:
    /// - `payload`: [`Payload::Job`]
    JobStarted,

    /// A job's transport was closed and the job left the registry.
    ///
    /// Sets:
    /// - `payload`: [`Payload::Job`]
    /// - `reason`: close error, if the transport reported one
    JobStopped,

    // === Collaborator events ===
    /// An implant opened an interactive session.
    ///
    /// Sets:
    /// - `payload`: [`Payload::Session`]
    SessionConnected,

    /// An interactive session went away.
    ///
    /// Sets:
    /// - `payload`: [`Payload::Session`]
    SessionDisconnected,

    /// A beacon checked in for the first time.
    ///
    /// Sets:
    /// - `payload`: [`Payload::Session`]
    BeaconRegistered,

    /// An operator connected to the multiplayer listener.
    ///
    /// Sets:
    /// - `payload`: [`Payload::Operator`]
    OperatorJoined,

    /// An operator disconnected from the multiplayer listener.
    ///
    /// Sets:
    /// - `payload`: [`Payload::Operator`]
    OperatorLeft,

    /// A pending operation was canceled.
    ///
    /// Sets:
    /// - `reason`: what was canceled
    Canceled,

    /// Any other kind, named by the collaborator that publishes it.
    Other(Arc<str>),
}

impl EventKind {
    /// Returns a short stable label (snake_case) for logs.
    pub fn as_label(&self) -> &str {
        match self {
            EventKind::JobStarted => "job_started",
            EventKind::JobStopped => "job_stopped",
            EventKind::SessionConnected => "session_connected",
            EventKind::SessionDisconnected => "session_disconnected",
            EventKind::BeaconRegistered => "beacon_registered",
            EventKind::OperatorJoined => "operator_joined",
            EventKind::OperatorLeft => "operator_left",
            EventKind::Canceled => "canceled",
            EventKind::Other(name) => &**name,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Reference to an implant session or beacon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRef {
    /// Session or beacon identifier.
    pub id: Arc<str>,
    /// Implant display name.
    pub name: Arc<str>,
}

impl SessionRef {
    pub fn new(id: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Reference to a connected operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorRef {
    /// Operator name from their client certificate.
    pub name: Arc<str>,
}

impl OperatorRef {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self { name: name.into() }
    }
}

/// What an event is about.
#[derive(Debug, Clone)]
pub enum Payload {
    /// Job events carry the job itself.
    Job(Arc<Job>),
    /// Session and beacon events.
    Session(SessionRef),
    /// Multiplayer events.
    Operator(OperatorRef),
}

/// Relayed event with optional payload.
#[derive(Debug, Clone)]
pub struct Event {
    /// Event classification.
    pub kind: EventKind,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Job, session, or operator the event concerns.
    pub payload: Option<Payload>,
    /// Human-readable detail (errors, cancel targets, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates an event of the given kind stamped with the current time.
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            at: SystemTime::now(),
            payload: None,
            reason: None,
        }
    }

    /// `JobStarted` for `job`.
    pub fn job_started(job: Arc<Job>) -> Self {
        Self::new(EventKind::JobStarted).with_job(job)
    }

    /// `JobStopped` for `job`.
    pub fn job_stopped(job: Arc<Job>) -> Self {
        Self::new(EventKind::JobStopped).with_job(job)
    }

    #[inline]
    pub fn with_job(mut self, job: Arc<Job>) -> Self {
        self.payload = Some(Payload::Job(job));
        self
    }

    #[inline]
    pub fn with_session(mut self, session: SessionRef) -> Self {
        self.payload = Some(Payload::Session(session));
        self
    }

    #[inline]
    pub fn with_operator(mut self, operator: OperatorRef) -> Self {
        self.payload = Some(Payload::Operator(operator));
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// The job payload, if any.
    pub fn job(&self) -> Option<&Arc<Job>> {
        match &self.payload {
            Some(Payload::Job(job)) => Some(job),
            _ => None,
        }
    }

    /// The session payload, if any.
    pub fn session(&self) -> Option<&SessionRef> {
        match &self.payload {
            Some(Payload::Session(s)) => Some(s),
            _ => None,
        }
    }

    /// The operator payload, if any.
    pub fn operator(&self) -> Option<&OperatorRef> {
        match &self.payload {
            Some(Payload::Operator(o)) => Some(o),
            _ => None,
        }
    }

    #[inline]
    pub fn is_job_event(&self) -> bool {
        matches!(self.kind, EventKind::JobStarted | EventKind::JobStopped)
    }
}
