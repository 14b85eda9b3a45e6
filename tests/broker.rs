mod common;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::{next_of, FakeListener};
use jobvisor::{Config, Event, EventKind, OperatorRef, Server, SessionRef, Subscribe};

#[tokio::test]
async fn unsubscribed_observer_gets_nothing_further() {
    let server = Server::builder(Config::default()).build();
    let mut leaving = server.subscribe();
    let mut staying = server.subscribe();

    assert!(server.unsubscribe(leaving.id()));
    let delivered = server.publish(
        Event::new(EventKind::SessionConnected).with_session(SessionRef::new("a1", "BRAVE_OTTER")),
    );
    assert_eq!(delivered, 1);

    assert!(leaving.recv().await.is_none());
    let ev = next_of(&mut staying, EventKind::SessionConnected).await;
    assert_eq!(ev.session().map(|s| s.name.as_ref()), Some("BRAVE_OTTER"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stalled_subscriber_does_not_block_publish_or_others() {
    let server = Server::builder(Config::default()).build();
    let stalled = server.broker().subscribe_with_capacity(1);
    let mut healthy = server.broker().subscribe_with_capacity(1024);

    let started = Instant::now();
    for i in 0..1000 {
        server.publish(Event::new(EventKind::Canceled).with_reason(i.to_string()));
    }
    assert!(started.elapsed() < Duration::from_secs(1), "publish stalled");

    assert_eq!(stalled.dropped(), 999);
    for i in 0..1000 {
        let ev = healthy.try_recv().expect("healthy subscriber got every event");
        assert_eq!(ev.reason.as_deref(), Some(i.to_string().as_str()));
    }
    assert_eq!(healthy.dropped(), 0);
}

#[tokio::test]
async fn stop_completes_while_a_subscriber_is_stuck() {
    let server = Server::builder(Config::default()).build();
    let _stuck = server.broker().subscribe_with_capacity(1);
    let mut watcher = server.subscribe();

    // JobStarted fills the stuck queue; JobStopped must still get through.
    let id = server.start_job(FakeListener::new("rpc", 9000)).await.unwrap();
    server.stop_job(id).unwrap();

    next_of(&mut watcher, EventKind::JobStopped).await;
    assert!(server.jobs().is_empty());
}

#[tokio::test]
async fn collaborator_events_are_relayed_unchanged() {
    let server = Server::builder(Config::default()).build();
    let mut sub = server.subscribe();

    server.publish(Event::new(EventKind::OperatorJoined).with_operator(OperatorRef::new("alice")));
    server.publish(Event::new(EventKind::Other("watchtower_hit".into())).with_reason("vt"));

    let joined = sub.recv().await.unwrap();
    assert_eq!(joined.kind, EventKind::OperatorJoined);
    assert_eq!(joined.operator().map(|o| o.name.as_ref()), Some("alice"));

    let other = sub.recv().await.unwrap();
    assert_eq!(other.kind.as_label(), "watchtower_hit");
    assert_eq!(other.reason.as_deref(), Some("vt"));
}

#[derive(Default)]
struct Journal {
    lines: Mutex<Vec<String>>,
}

#[async_trait]
impl Subscribe for Journal {
    async fn on_event(&self, ev: &Event) {
        let id = ev.job().map(|j| j.id).unwrap_or_default();
        self.lines.lock().unwrap().push(format!("{} {id}", ev.kind));
    }

    fn name(&self) -> &'static str {
        "journal"
    }
}

#[tokio::test]
async fn attached_subscriber_sees_job_lifecycle_in_order() {
    let journal = Arc::new(Journal::default());
    let server = Server::builder(Config::default())
        .with_subscriber(journal.clone())
        .build();
    let mut watcher = server.subscribe();

    let a = server.start_job(FakeListener::new("mtls", 8888)).await.unwrap();
    let b = server.start_job(FakeListener::new("dns", 53)).await.unwrap();
    server.stop_job(a).unwrap();
    next_of(&mut watcher, EventKind::JobStopped).await;

    server.shutdown().await.unwrap();

    let lines = journal.lines.lock().unwrap().clone();
    assert_eq!(&lines[..3], ["job_started 1", "job_started 2", "job_stopped 1"]);
    assert!(lines.contains(&format!("job_stopped {b}")));
    assert_eq!(lines.len(), 4);
    assert_eq!(server.broker().subscriber_count(), 1, "only the watcher is left");
}
