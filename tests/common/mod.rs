#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jobvisor::{Bound, Event, EventKind, JobSpec, Listener, Protocol, Subscription};

/// Listener that binds nothing and closes instantly.
pub struct FakeListener {
    pub name: &'static str,
    pub port: u16,
}

impl FakeListener {
    pub fn new(name: &'static str, port: u16) -> Self {
        Self { name, port }
    }
}

#[async_trait]
impl Listener for FakeListener {
    type Handle = ();

    fn name(&self) -> &str {
        self.name
    }

    async fn bind(&self) -> anyhow::Result<Bound<()>> {
        Ok(Bound {
            handle: (),
            spec: JobSpec::new(self.name, "in-memory listener", Protocol::Tcp, self.port),
        })
    }

    async fn close(&self, _handle: ()) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Receives the next event of `kind`, skipping others, within two seconds.
pub async fn next_of(sub: &mut Subscription, kind: EventKind) -> Arc<Event> {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let ev = sub.recv().await.expect("subscription closed");
            if ev.kind == kind {
                return ev;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}
