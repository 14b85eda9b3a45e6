//! # LogWriter - event logger
//!
//! A subscriber that writes every relayed [`Event`] through `tracing`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO jobvisor: job started job_id=1 name=rpc protocol=tcp port=31337
//! INFO jobvisor: job stopped job_id=1 name=rpc protocol=tcp port=31337
//! INFO jobvisor: session connected session=4f2a name=QUIET_FALCON
//! INFO jobvisor: operator joined operator=alice
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind, Payload};
use crate::subscribers::Subscribe;

/// Event logging subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let reason = e.reason.as_deref().unwrap_or("");
        match (&e.kind, &e.payload) {
            (EventKind::JobStopped, Some(Payload::Job(job))) if !reason.is_empty() => {
                tracing::warn!(
                    target: "jobvisor",
                    job_id = job.id,
                    name = %job.name,
                    reason,
                    "job stopped with errors"
                );
            }
            (kind, Some(Payload::Job(job))) => {
                tracing::info!(
                    target: "jobvisor",
                    job_id = job.id,
                    name = %job.name,
                    protocol = %job.protocol,
                    port = job.port,
                    "{}",
                    kind.as_label().replace('_', " ")
                );
            }
            (kind, Some(Payload::Session(s))) => {
                tracing::info!(
                    target: "jobvisor",
                    session = %s.id,
                    name = %s.name,
                    "{}",
                    kind.as_label().replace('_', " ")
                );
            }
            (kind, Some(Payload::Operator(o))) => {
                tracing::info!(
                    target: "jobvisor",
                    operator = %o.name,
                    "{}",
                    kind.as_label().replace('_', " ")
                );
            }
            (kind, None) => {
                tracing::info!(target: "jobvisor", reason, "{}", kind.as_label().replace('_', " "));
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
