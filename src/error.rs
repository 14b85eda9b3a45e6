//! Error types used by the job server.
//!
//! This module defines two enums:
//!
//! - [`JobError`] — errors returned by job control operations (start/stop).
//! - [`RuntimeError`] — errors raised while tearing the whole server down.
//!
//! Both provide `as_label` for logs/metrics. Transport collaborators report
//! their own failures as opaque [`anyhow::Error`]s, carried here as sources.

use std::any::Any;
use std::time::Duration;

use thiserror::Error;

use crate::jobs::JobId;

/// # Errors produced by job control.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum JobError {
    /// No job with this identifier is registered (never existed, or already
    /// stopped). Recoverable; registry state is untouched.
    #[error("job {id} not found")]
    NotFound {
        /// The identifier that was looked up.
        id: JobId,
    },

    /// The listener failed to bind its transport. No job was created.
    #[error("failed to start {name} listener: {source}")]
    Bind {
        /// Kind tag of the listener that failed.
        name: String,
        /// Collaborator-reported cause.
        #[source]
        source: anyhow::Error,
    },

    /// The server is shutting down and accepts no new jobs.
    #[error("server is shutting down")]
    ShuttingDown,
}

impl JobError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use jobvisor::JobError;
    ///
    /// let err = JobError::NotFound { id: 7 };
    /// assert_eq!(err.as_label(), "job_not_found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            JobError::NotFound { .. } => "job_not_found",
            JobError::Bind { .. } => "job_bind_failed",
            JobError::ShuttingDown => "job_shutting_down",
        }
    }

    /// True for [`JobError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, JobError::NotFound { .. })
    }
}

/// # Errors produced while shutting the server down.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some jobs were still registered.
    #[error("shutdown timeout {grace:?} exceeded; stuck jobs: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Jobs still registered when the grace period ran out.
        stuck: Vec<JobId>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use jobvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
