//! # Job: one running network service.
//!
//! A [`Job`] is the registry's view of a listener that is currently bound:
//! its identifier, kind tag, transport family, bound port, and the single-use
//! stop signal that asks its supervising task to shut it down.
//!
//! ## Rules
//! - The job does **not** own the transport handle; the listener that bound
//!   it keeps the handle inside its supervising task.
//! - The stop signal fires at most once ([`Job::stop`] takes the sender out of
//!   its slot before sending).
//! - Metadata is immutable after construction; jobs are shared as `Arc<Job>`.

use std::borrow::Cow;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use tokio::sync::oneshot;

/// Job identifier, allocated by the registry and never reused.
pub type JobId = u32;

/// Receiving half of a job's stop signal, awaited by its supervising task.
pub type StopSignal = oneshot::Receiver<()>;

/// Transport family of a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Stream listeners (rpc, mtls, http/https).
    Tcp,
    /// Datagram listeners (dns, wireguard).
    Udp,
}

impl Protocol {
    /// Returns the lowercase tag (`"tcp"` / `"udp"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a listener reports about itself after a successful bind.
///
/// `port` is the port actually bound, so a listener asked for port `0`
/// reports the one the OS picked. Transports without a port use `0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    /// Short machine-readable kind tag (`"rpc"`, `"mtls"`, `"http"`, `"dns"`).
    pub name: Cow<'static, str>,
    /// Human-readable description.
    pub description: String,
    /// Transport family.
    pub protocol: Protocol,
    /// Bound port (`0` if not applicable).
    pub port: u16,
}

impl JobSpec {
    /// Builds the metadata reported by a bound listener.
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        description: impl Into<String>,
        protocol: Protocol,
        port: u16,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            protocol,
            port,
        }
    }
}

/// A tracked, uniquely identified running network service.
pub struct Job {
    /// Unique identifier.
    pub id: JobId,
    /// Short kind tag.
    pub name: Cow<'static, str>,
    /// Human-readable description.
    pub description: String,
    /// Transport family.
    pub protocol: Protocol,
    /// Bound port (`0` if not applicable).
    pub port: u16,

    stop: Mutex<Option<oneshot::Sender<()>>>,
}

impl Job {
    /// Creates a job together with the receiving end of its stop signal.
    ///
    /// The receiver belongs to whoever supervises the job's shutdown.
    pub fn new(id: JobId, spec: JobSpec) -> (Self, StopSignal) {
        let (tx, rx) = oneshot::channel();
        let job = Self {
            id,
            name: spec.name,
            description: spec.description,
            protocol: spec.protocol,
            port: spec.port,
            stop: Mutex::new(Some(tx)),
        };
        (job, rx)
    }

    /// Fires the stop signal.
    ///
    /// Returns `true` if this call fired it, `false` if it had already been
    /// fired by an earlier call.
    pub fn stop(&self) -> bool {
        let tx = self
            .stop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match tx {
            Some(tx) => {
                // Supervisor may already be gone during server teardown.
                let _ = tx.send(());
                true
            }
            None => false,
        }
    }

    /// True once the stop signal has been fired.
    pub fn is_stopping(&self) -> bool {
        self.stop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Returns the job's metadata as a [`JobSpec`].
    pub fn spec(&self) -> JobSpec {
        JobSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            protocol: self.protocol,
            port: self.port,
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("protocol", &self.protocol)
            .field("port", &self.port)
            .field("stopping", &self.is_stopping())
            .finish()
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} {}/{} ({})",
            self.id, self.name, self.protocol, self.port, self.description
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rpc() -> JobSpec {
        JobSpec::new("rpc", "client listener", Protocol::Tcp, 31337)
    }

    #[test]
    fn protocol_tags() {
        assert_eq!(Protocol::Tcp.to_string(), "tcp");
        assert_eq!(Protocol::Udp.to_string(), "udp");
    }

    #[tokio::test]
    async fn stop_fires_exactly_once() {
        let (job, rx) = Job::new(1, rpc());
        assert!(!job.is_stopping());

        assert!(job.stop());
        assert!(job.is_stopping());
        assert!(!job.stop(), "second stop must not fire again");

        rx.await.expect("signal delivered");
    }

    #[test]
    fn stop_without_receiver_still_counts_as_fired() {
        let (job, rx) = Job::new(7, rpc());
        drop(rx);
        assert!(job.stop());
        assert!(!job.stop());
    }

    #[test]
    fn display_and_spec() {
        let (job, _rx) = Job::new(3, rpc());
        assert_eq!(job.to_string(), "#3 rpc tcp/31337 (client listener)");
        assert_eq!(job.spec(), rpc());
    }
}
