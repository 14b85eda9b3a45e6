//! # Example: multiplayer + DNS listeners with live event log
//!
//! Starts the operator RPC listener and a DNS listener, prints the job
//! table, logs every lifecycle event, and tears everything down on Ctrl-C.
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example multiplayer
//! ```

use std::sync::Arc;

use jobvisor::{
    render_table, Config, LogWriter, Server, Subscribe, TcpListenerJob, UdpListenerJob,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let server = Server::builder(Config::default())
        .with_subscribers(subs)
        .build();

    let rpc = TcpListenerJob::rpc("127.0.0.1", 31337, |stream, peer| {
        tracing::info!(%peer, "operator connected");
        tokio::spawn(async move {
            // Multiplayer protocol handling lives elsewhere.
            drop(stream);
        });
    });
    server.start_job(rpc).await?;

    let dns = UdpListenerJob::dns("127.0.0.1", 0, &["example.com"], |query, peer, _socket| {
        tracing::debug!(%peer, bytes = query.len(), "dns query");
    });
    server.start_job(dns).await?;

    println!("{}", render_table(&server.jobs()));

    server.run_until_shutdown_signal().await?;
    Ok(())
}
