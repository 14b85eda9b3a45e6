//! # TCP listener job.
//!
//! Binds a [`TcpListener`] and hands every accepted connection to a
//! caller-supplied handler. Closing the job ends the accept loop and drops
//! the listening socket; connections already handed out keep running.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tokio::net::{TcpListener, TcpStream};

use crate::jobs::{JobSpec, Protocol};

use super::accept::{pause_after_error, AcceptLoop};
use super::{Bound, Listener};

type ConnHandler = Arc<dyn Fn(TcpStream, SocketAddr) + Send + Sync>;

/// Listener job over TCP.
///
/// ## Example
/// ```no_run
/// use jobvisor::{Config, Server, TcpListenerJob};
///
/// # async fn demo() -> Result<(), jobvisor::JobError> {
/// let server = Server::builder(Config::default()).build();
/// let rpc = TcpListenerJob::rpc("0.0.0.0", 31337, |stream, peer| {
///     tokio::spawn(async move {
///         let _ = (stream, peer); // serve the operator connection
///     });
/// });
/// let id = server.start_job(rpc).await?;
/// server.stop_job(id)?;
/// # Ok(())
/// # }
/// ```
pub struct TcpListenerJob {
    name: String,
    description: String,
    host: String,
    port: u16,
    handler: ConnHandler,
}

impl TcpListenerJob {
    /// Creates a TCP listener of kind `name` bound to `host:port`.
    ///
    /// `handler` is called from the accept loop and should hand the
    /// connection off quickly (typically by spawning a task).
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        handler: F,
    ) -> Self
    where
        F: Fn(TcpStream, SocketAddr) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            host: host.into(),
            port,
            handler: Arc::new(handler),
        }
    }

    /// Multiplayer listener for operator clients.
    pub fn rpc<F>(host: impl Into<String>, port: u16, handler: F) -> Self
    where
        F: Fn(TcpStream, SocketAddr) + Send + Sync + 'static,
    {
        Self::new("rpc", "client listener", host, port, handler)
    }
}

#[async_trait]
impl Listener for TcpListenerJob {
    type Handle = AcceptLoop;

    fn name(&self) -> &str {
        &self.name
    }

    async fn bind(&self) -> anyhow::Result<Bound<AcceptLoop>> {
        let listener = TcpListener::bind((self.host.as_str(), self.port))
            .await
            .with_context(|| format!("bind tcp {}:{}", self.host, self.port))?;
        let port = listener.local_addr()?.port();

        let handler = Arc::clone(&self.handler);
        let name = self.name.clone();
        let handle = AcceptLoop::spawn(move |cancel| async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    res = listener.accept() => match res {
                        Ok((stream, peer)) => handler(stream, peer),
                        Err(err) => {
                            tracing::warn!(name = %name, port, error = %err, "accept failed");
                            pause_after_error(&cancel).await;
                        }
                    }
                }
            }
        });

        Ok(Bound {
            handle,
            spec: JobSpec::new(self.name.clone(), self.description.clone(), Protocol::Tcp, port),
        })
    }

    async fn close(&self, handle: AcceptLoop) -> anyhow::Result<()> {
        handle.stop().await
    }
}
