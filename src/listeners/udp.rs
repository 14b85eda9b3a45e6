//! # UDP listener job.
//!
//! Binds a [`UdpSocket`] and hands every datagram to a handler together
//! with the shared socket, so the handler can answer (DNS-style).

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tokio::net::UdpSocket;

use crate::jobs::{JobSpec, Protocol};

use super::accept::{pause_after_error, AcceptLoop};
use super::{Bound, Listener};

/// Largest UDP payload.
const MAX_DATAGRAM: usize = 65_535;

type DatagramHandler = Arc<dyn Fn(Vec<u8>, SocketAddr, Arc<UdpSocket>) + Send + Sync>;

/// Listener job over UDP.
pub struct UdpListenerJob {
    name: String,
    description: String,
    host: String,
    port: u16,
    handler: DatagramHandler,
}

impl UdpListenerJob {
    /// Creates a UDP listener of kind `name` bound to `host:port`.
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        handler: F,
    ) -> Self
    where
        F: Fn(Vec<u8>, SocketAddr, Arc<UdpSocket>) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            host: host.into(),
            port,
            handler: Arc::new(handler),
        }
    }

    /// DNS listener answering for `domains`.
    pub fn dns<F>(host: impl Into<String>, port: u16, domains: &[&str], handler: F) -> Self
    where
        F: Fn(Vec<u8>, SocketAddr, Arc<UdpSocket>) + Send + Sync + 'static,
    {
        let description = format!("DNS listener domains: {}", domains.join(", "));
        Self::new("dns", description, host, port, handler)
    }
}

#[async_trait]
impl Listener for UdpListenerJob {
    type Handle = AcceptLoop;

    fn name(&self) -> &str {
        &self.name
    }

    async fn bind(&self) -> anyhow::Result<Bound<AcceptLoop>> {
        let socket = UdpSocket::bind((self.host.as_str(), self.port))
            .await
            .with_context(|| format!("bind udp {}:{}", self.host, self.port))?;
        let port = socket.local_addr()?.port();
        let socket = Arc::new(socket);

        let handler = Arc::clone(&self.handler);
        let name = self.name.clone();
        let handle = AcceptLoop::spawn(move |cancel| async move {
            let mut buf = vec![0u8; MAX_DATAGRAM];
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    res = socket.recv_from(&mut buf) => match res {
                        Ok((n, peer)) => handler(buf[..n].to_vec(), peer, Arc::clone(&socket)),
                        Err(err) => {
                            tracing::warn!(name = %name, port, error = %err, "recv failed");
                            pause_after_error(&cancel).await;
                        }
                    }
                }
            }
        });

        Ok(Bound {
            handle,
            spec: JobSpec::new(self.name.clone(), self.description.clone(), Protocol::Udp, port),
        })
    }

    async fn close(&self, handle: AcceptLoop) -> anyhow::Result<()> {
        handle.stop().await
    }
}
