mod common;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use common::{next_of, FakeListener};
use jobvisor::{
    render_table, AcceptLoop, Bound, Config, EventKind, Job, JobId, JobRegistry, JobSpec,
    Listener, Protocol, Server, TcpListenerJob,
};
use tokio::net::{TcpListener, TcpStream};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn rpc_job_end_to_end() {
    let server = Server::builder(Config::default()).build();
    let mut events = server.subscribe();

    let id = server.start_job(FakeListener::new("rpc", 9000)).await.unwrap();
    assert_eq!(id, 1);

    let jobs = server.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id, 1);
    assert_eq!(jobs[0].name, "rpc");
    assert_eq!(jobs[0].port, 9000);

    server.stop_job(1).unwrap();
    let stopped = next_of(&mut events, EventKind::JobStopped).await;
    assert_eq!(stopped.job().map(|j| j.id), Some(1));
    assert!(server.jobs().is_empty());
    assert_eq!(render_table(&server.jobs()), "No active jobs");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_start_and_stop_of_many_jobs() {
    const N: usize = 128;

    let server = Server::builder(Config::default()).build();
    let mut events = server.broker().subscribe_with_capacity(4 * N);

    let starts: Vec<_> = (0..N)
        .map(|i| {
            let server = Arc::clone(&server);
            tokio::spawn(async move {
                server
                    .start_job(FakeListener::new("http", 8000 + i as u16))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for h in starts {
        assert!(ids.insert(h.await.unwrap()), "duplicate job id");
    }
    assert_eq!(ids.len(), N);
    assert_eq!(server.jobs().len(), N);

    let stops: Vec<_> = ids
        .iter()
        .map(|&id| {
            let server = Arc::clone(&server);
            tokio::spawn(async move { server.stop_job(id) })
        })
        .collect();
    for h in stops {
        h.await.unwrap().unwrap();
    }

    let mut stopped = HashSet::new();
    while stopped.len() < N {
        let ev = next_of(&mut events, EventKind::JobStopped).await;
        let id = ev.job().expect("job payload").id;
        assert!(stopped.insert(id), "job {id} stopped twice");
    }
    assert_eq!(stopped, ids);
    assert!(server.jobs().is_empty());

    tokio::time::sleep(Duration::from_millis(50)).await;
    while let Some(ev) = events.try_recv() {
        assert_ne!(ev.kind, EventKind::JobStopped, "extra JobStopped event");
    }
    assert_eq!(events.dropped(), 0);
}

#[tokio::test]
async fn stop_unknown_job_leaves_registry_unchanged() {
    let server = Server::builder(Config::default()).build();
    server.start_job(FakeListener::new("dns", 53)).await.unwrap();
    server.start_job(FakeListener::new("mtls", 8888)).await.unwrap();
    let before = server.registry().ids();

    let err = server.stop_job(1000).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "job 1000 not found");
    assert_eq!(server.registry().ids(), before);
}

#[tokio::test]
async fn stop_after_job_is_gone_is_not_found() {
    let server = Server::builder(Config::default()).build();
    let mut events = server.subscribe();
    let id = server.start_job(FakeListener::new("rpc", 1)).await.unwrap();

    server.stop_job(id).unwrap();
    next_of(&mut events, EventKind::JobStopped).await;

    assert!(server.stop_job(id).unwrap_err().is_not_found());
}

#[tokio::test]
async fn ids_keep_increasing_after_stops() {
    let server = Server::builder(Config::default()).build();
    let mut events = server.subscribe();

    let first = server.start_job(FakeListener::new("rpc", 1)).await.unwrap();
    server.stop_job(first).unwrap();
    next_of(&mut events, EventKind::JobStopped).await;

    let second = server.start_job(FakeListener::new("rpc", 1)).await.unwrap();
    assert!(second > first);
}

#[test]
fn registry_list_is_linearizable_under_contention() {
    let reg = Arc::new(JobRegistry::new());
    // Even ids stay forever, odd ids are removed right after insertion.
    let kept: Arc<Mutex<HashSet<JobId>>> = Arc::default();
    let removed: Arc<Mutex<HashSet<JobId>>> = Arc::default();

    let writers: Vec<_> = (0..4)
        .map(|_| {
            let (reg, kept, removed) = (Arc::clone(&reg), Arc::clone(&kept), Arc::clone(&removed));
            std::thread::spawn(move || {
                for _ in 0..500 {
                    let id = reg.next_id();
                    let (job, _rx) =
                        Job::new(id, JobSpec::new("http", "stress", Protocol::Tcp, 80));
                    reg.add(Arc::new(job));
                    if id % 2 == 0 {
                        kept.lock().unwrap().insert(id);
                    } else {
                        reg.remove(id);
                        removed.lock().unwrap().insert(id);
                    }
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..2)
        .map(|_| {
            let (reg, kept, removed) = (Arc::clone(&reg), Arc::clone(&kept), Arc::clone(&removed));
            std::thread::spawn(move || {
                for _ in 0..300 {
                    let must_have = kept.lock().unwrap().clone();
                    let must_not_have = removed.lock().unwrap().clone();

                    let listed = reg.list();
                    let ids: Vec<JobId> = listed.iter().map(|j| j.id).collect();
                    let set: HashSet<JobId> = ids.iter().copied().collect();

                    assert_eq!(set.len(), ids.len(), "duplicate id in snapshot");
                    assert!(ids.windows(2).all(|w| w[0] < w[1]), "snapshot not sorted");
                    assert!(must_have.is_subset(&set), "snapshot lost a kept job");
                    assert!(must_not_have.is_disjoint(&set), "snapshot shows removed job");
                }
            })
        })
        .collect();

    for t in writers.into_iter().chain(readers) {
        t.join().unwrap();
    }

    let expected: HashSet<JobId> = kept.lock().unwrap().clone();
    let actual: HashSet<JobId> = reg.ids().into_iter().collect();
    assert_eq!(actual, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn tcp_rpc_listener_lifecycle() {
    let server = Server::builder(Config::default()).build();
    let mut events = server.subscribe();

    let id = server
        .start_job(TcpListenerJob::rpc("127.0.0.1", 0, |_stream, _peer| {}))
        .await
        .unwrap();

    let started = next_of(&mut events, EventKind::JobStarted).await;
    let job = started.job().expect("job payload");
    assert_eq!(job.id, id);
    assert_eq!(job.name, "rpc");
    assert_eq!(job.description, "client listener");
    assert_eq!(job.protocol, Protocol::Tcp);
    let port = job.port;
    assert_ne!(port, 0);

    TcpStream::connect(("127.0.0.1", port)).await.expect("listener accepts");

    server.stop_job(id).unwrap();
    next_of(&mut events, EventKind::JobStopped).await;
    assert!(TcpStream::connect(("127.0.0.1", port)).await.is_err());
}

#[tokio::test]
async fn tcp_bind_conflict_registers_nothing() {
    let server = Server::builder(Config::default()).build();
    let mut events = server.subscribe();

    let first = server
        .start_job(TcpListenerJob::rpc("127.0.0.1", 0, |_, _| {}))
        .await
        .unwrap();
    let port = server.job(first).unwrap().port;
    next_of(&mut events, EventKind::JobStarted).await;

    let err = server
        .start_job(TcpListenerJob::rpc("127.0.0.1", port, |_, _| {}))
        .await
        .unwrap_err();
    assert_eq!(err.as_label(), "job_bind_failed");
    assert_eq!(server.registry().ids(), vec![first]);
    assert!(events.try_recv().is_none(), "failed bind published an event");

    server.shutdown().await.unwrap();
}

/// HTTP-style listener written outside the crate on top of `AcceptLoop`.
struct HttpListener;

#[async_trait]
impl Listener for HttpListener {
    type Handle = AcceptLoop;

    fn name(&self) -> &str {
        "http"
    }

    async fn bind(&self) -> anyhow::Result<Bound<AcceptLoop>> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let port = listener.local_addr()?.port();
        let handle = AcceptLoop::spawn(move |cancel| async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    res = listener.accept() => drop(res),
                }
            }
        });
        Ok(Bound {
            handle,
            spec: JobSpec::new("http", "web server", Protocol::Tcp, port),
        })
    }

    async fn close(&self, handle: AcceptLoop) -> anyhow::Result<()> {
        handle.stop().await
    }
}

#[tokio::test]
async fn custom_listener_on_accept_loop() {
    let server = Server::builder(Config::default()).build();
    let mut events = server.subscribe();

    let id = server.start_job(HttpListener).await.unwrap();
    let port = server.job(id).unwrap().port;
    TcpStream::connect(("127.0.0.1", port)).await.expect("listener accepts");

    server.stop_job(id).unwrap();
    let stopped = next_of(&mut events, EventKind::JobStopped).await;
    assert!(stopped.reason.is_none());
    assert!(TcpStream::connect(("127.0.0.1", port)).await.is_err());
}
