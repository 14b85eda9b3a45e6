//! # Listeners: the transport side of a job.
//!
//! A [`Listener`] knows how to bind one kind of transport and how to close
//! it again. The server drives it through the launch sequence:
//!
//! ```text
//! Server::start_job(listener)
//!   ├─► listener.bind()              Err → JobError::Bind, nothing registered
//!   ├─► shutdown began meanwhile?    yes → close(handle), JobError::ShuttingDown
//!   ├─► Job::new(registry.next_id(), bound.spec)
//!   ├─► registry.add(job)  ──► publish JobStarted
//!   ├─► spawn supervising task ─┐
//!   └─► return job id           │
//!                               ▼
//!                     stop signal fires
//!                       ├─► listener.close(handle)   (error or panic logged, not fatal)
//!                       ├─► registry.remove(job.id)
//!                       └─► publish JobStopped
//! ```
//!
//! The listener keeps ownership of its handle: the job only carries
//! metadata and the stop signal.
//!
//! Built-in listeners:
//! - [`TcpListenerJob`] accept loop over `tokio::net::TcpListener`
//! - [`UdpListenerJob`] datagram loop over `tokio::net::UdpSocket`

mod accept;
mod tcp;
mod udp;

use async_trait::async_trait;

use crate::jobs::JobSpec;

pub use accept::AcceptLoop;
pub use tcp::TcpListenerJob;
pub use udp::UdpListenerJob;

/// A successfully bound transport and the job metadata describing it.
#[derive(Debug)]
pub struct Bound<H> {
    /// Transport handle, handed back to [`Listener::close`] on stop.
    pub handle: H,
    /// Metadata for the job that will track this transport.
    pub spec: JobSpec,
}

/// Transport collaborator for one listener kind.
///
/// ### Implementation requirements
/// - `bind` must not leave anything running when it fails.
/// - `close` stops accepting new work (ends the accept loop) but leaves
///   already accepted connections alone.
/// - `close` should complete promptly; the server does not time it out.
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    /// Whatever the listener needs to close the transport later.
    type Handle: Send + 'static;

    /// Kind tag (`"rpc"`, `"mtls"`, `"dns"`, ...) used before a bind succeeds.
    fn name(&self) -> &str;

    /// Binds/opens the transport.
    async fn bind(&self) -> anyhow::Result<Bound<Self::Handle>>;

    /// Closes a transport previously returned by [`bind`](Self::bind).
    async fn close(&self, handle: Self::Handle) -> anyhow::Result<()>;
}
