//! # Server: job control surface and lifecycle owner.
//!
//! The [`Server`] owns the [`JobRegistry`], the [`Broker`], the supervising
//! tasks of every job, and the workers of attached [`Subscribe`]rs. It is
//! created once at startup and passed by reference (`Arc<Server>`) to every
//! collaborator that starts jobs, stops them, or observes events.
//!
//! ## Key responsibilities
//! - run the listener launch sequence ([`Server::start_job`])
//! - signal a job's stop exactly once ([`Server::stop_job`])
//! - snapshot running jobs ([`Server::jobs`])
//! - relay events between publishers and subscribers
//! - stop everything on shutdown within [`Config::grace`]
//!
//! ## High-level architecture
//! ```text
//! start_job(listener)
//!   ├─► listener.bind() ────────────── Err ──► JobError::Bind
//!   └─► [launch guard] ── shutting down ──► close(handle), JobError::ShuttingDown
//!         ├─► registry.add(Job)
//!         ├─► broker.publish(JobStarted)
//!         └─► supervisors.spawn(supervise) ──► wait stop signal
//!                                                ├─► listener.close(handle)  (error/panic → reason)
//!                                                ├─► registry.remove(id)
//!                                                └─► broker.publish(JobStopped)
//!
//! stop_job(id) ──► registry.get(id) ──► job.stop()    (fires once)
//!
//! shutdown()
//!   ├─► [launch guard] close supervisors, job.stop() for every registered job
//!   ├─► wait supervisors (≤ grace) ── timeout ──► RuntimeError::GraceExceeded
//!   └─► drain + stop subscriber workers (within what is left of grace)
//! ```
//!
//! The launch guard makes "register a job" and "begin shutdown" mutually
//! exclusive, so no job can slip in after shutdown listed the jobs. It is
//! taken before the registry and broker locks, never after. The registry
//! lock and the broker lock are never held together: a supervising task
//! removes the job first, then publishes.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use jobvisor::{Config, EventKind, LogWriter, Server, Subscribe, TcpListenerJob};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::builder(Config::default())
//!         .with_subscribers(vec![Arc::new(LogWriter::new()) as Arc<dyn Subscribe>])
//!         .build();
//!
//!     let mut events = server.subscribe();
//!     let id = server
//!         .start_job(TcpListenerJob::rpc("127.0.0.1", 31337, |_stream, _peer| {}))
//!         .await?;
//!
//!     server.stop_job(id)?;
//!     while let Some(ev) = events.recv().await {
//!         if ev.kind == EventKind::JobStopped {
//!             break;
//!         }
//!     }
//!     server.shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use tokio::time::Instant;
use tokio_util::task::TaskTracker;

use crate::core::{builder::ServerBuilder, config::Config, shutdown};
use crate::error::{panic_message, JobError, RuntimeError};
use crate::events::{Broker, Event, Subscription, SubscriptionId};
use crate::jobs::{Job, JobId, JobRegistry, StopSignal};
use crate::listeners::{Bound, Listener};
use crate::subscribers::SubscriberWorker;

/// Control surface for starting, stopping, listing and observing jobs.
pub struct Server {
    cfg: Config,
    registry: Arc<JobRegistry>,
    broker: Arc<Broker>,
    supervisors: TaskTracker,
    launch: Mutex<()>,
    workers: Mutex<Vec<SubscriberWorker>>,
}

impl Server {
    /// Returns a builder for configuring subscribers.
    pub fn builder(cfg: Config) -> ServerBuilder {
        ServerBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        registry: Arc<JobRegistry>,
        broker: Arc<Broker>,
        workers: Vec<SubscriberWorker>,
    ) -> Self {
        Self {
            cfg,
            registry,
            broker,
            supervisors: TaskTracker::new(),
            launch: Mutex::new(()),
            workers: Mutex::new(workers),
        }
    }

    /// Binds `listener`, registers a job for it and starts its supervising task.
    ///
    /// Returns the new job's id as soon as the job is registered. On bind
    /// failure nothing is registered and no event is published. If shutdown
    /// began while the listener was binding, the fresh handle is closed and
    /// [`JobError::ShuttingDown`] is returned.
    pub async fn start_job<L: Listener>(&self, listener: L) -> Result<JobId, JobError> {
        if self.supervisors.is_closed() {
            return Err(JobError::ShuttingDown);
        }

        let Bound { handle, spec } = match listener.bind().await {
            Ok(bound) => bound,
            Err(source) => {
                tracing::warn!(name = listener.name(), error = %source, "listener bind failed");
                return Err(JobError::Bind {
                    name: listener.name().to_string(),
                    source,
                });
            }
        };

        let launched = {
            let _launch = self.launch.lock().unwrap_or_else(PoisonError::into_inner);
            if self.supervisors.is_closed() {
                Err((listener, handle))
            } else {
                let (job, stop) = Job::new(self.registry.next_id(), spec);
                let job = Arc::new(job);
                self.registry.add(Arc::clone(&job));
                tracing::info!(
                    job_id = job.id,
                    name = %job.name,
                    protocol = %job.protocol,
                    port = job.port,
                    "job started"
                );
                self.broker.publish(Event::job_started(Arc::clone(&job)));

                self.supervisors.spawn(supervise(
                    listener,
                    handle,
                    Arc::clone(&job),
                    stop,
                    Arc::clone(&self.registry),
                    Arc::clone(&self.broker),
                ));
                Ok(job.id)
            }
        };

        match launched {
            Ok(id) => Ok(id),
            Err((listener, handle)) => {
                tracing::warn!(name = listener.name(), "shutdown began during bind; closing listener");
                if let Err(err) = close_listener(&listener, handle).await {
                    tracing::warn!(name = listener.name(), error = %err, "listener close failed");
                }
                Err(JobError::ShuttingDown)
            }
        }
    }

    /// Signals job `id` to stop.
    ///
    /// Returns [`JobError::NotFound`] if no such job is registered. A job
    /// that is already stopping is left alone (its signal is never sent
    /// twice) and `Ok(())` is returned.
    pub fn stop_job(&self, id: JobId) -> Result<(), JobError> {
        let job = self.registry.get(id).ok_or(JobError::NotFound { id })?;
        if job.stop() {
            tracing::info!(job_id = id, name = %job.name, "stop requested");
        } else {
            tracing::debug!(job_id = id, name = %job.name, "job already stopping");
        }
        Ok(())
    }

    /// Snapshot of running jobs, sorted by id.
    pub fn jobs(&self) -> Vec<Arc<Job>> {
        self.registry.list()
    }

    /// Looks up a running job.
    pub fn job(&self, id: JobId) -> Option<Arc<Job>> {
        self.registry.get(id)
    }

    /// Subscribes to every event published from now on.
    pub fn subscribe(&self) -> Subscription {
        self.broker.subscribe()
    }

    /// Ends a subscription; returns `false` if it was not active.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.broker.unsubscribe(id)
    }

    /// Relays a collaborator event (sessions, beacons, operators, ...).
    pub fn publish(&self, event: Event) -> usize {
        self.broker.publish(event)
    }

    /// The job registry backing [`jobs`](Self::jobs).
    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// The event broker, for subscriptions with a custom capacity.
    pub fn broker(&self) -> &Arc<Broker> {
        &self.broker
    }

    /// Configuration this server was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Stops every job, waits up to [`Config::grace`] for their supervising
    /// tasks, then stops attached subscribers within whatever is left of
    /// the grace period.
    ///
    /// After this call [`start_job`](Self::start_job) returns
    /// [`JobError::ShuttingDown`].
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        {
            let _launch = self.launch.lock().unwrap_or_else(PoisonError::into_inner);
            self.supervisors.close();
            for job in self.registry.list() {
                job.stop();
            }
        }

        let grace = self.cfg.shutdown_grace();
        let deadline = grace.map(|g| Instant::now() + g);
        let res = match (grace, deadline) {
            (Some(grace), Some(deadline)) => {
                match tokio::time::timeout_at(deadline, self.supervisors.wait()).await {
                    Ok(()) => {
                        tracing::info!("all jobs stopped");
                        Ok(())
                    }
                    Err(_) => {
                        let stuck = self.registry.ids();
                        tracing::warn!(?grace, ?stuck, "shutdown grace exceeded");
                        Err(RuntimeError::GraceExceeded { grace, stuck })
                    }
                }
            }
            _ => Ok(()),
        };

        let workers = std::mem::take(
            &mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for w in workers {
            w.shutdown(&self.broker, deadline).await;
        }
        res
    }

    /// Waits for SIGINT/SIGTERM/SIGQUIT (Ctrl-C elsewhere), then
    /// [`shutdown`](Self::shutdown).
    pub async fn run_until_shutdown_signal(&self) -> Result<(), RuntimeError> {
        match shutdown::wait_for_shutdown_signal().await {
            Ok(signal) => tracing::info!(signal, "shutdown requested"),
            Err(err) => tracing::warn!(error = %err, "signal handlers unavailable; shutting down"),
        }
        self.shutdown().await
    }
}

/// Supervising task of one job: waits for its stop signal, then tears it down.
async fn supervise<L: Listener>(
    listener: L,
    handle: L::Handle,
    job: Arc<Job>,
    stop: StopSignal,
    registry: Arc<JobRegistry>,
    broker: Arc<Broker>,
) {
    // The sender lives inside `job`, which this task keeps alive.
    let _ = stop.await;
    tracing::info!(job_id = job.id, name = %job.name, "stopping job");

    let mut stopped = Event::job_stopped(Arc::clone(&job));
    if let Err(err) = close_listener(&listener, handle).await {
        tracing::warn!(job_id = job.id, name = %job.name, error = %err, "listener close failed");
        stopped = stopped.with_reason(format!("close failed: {err:#}"));
    }

    registry.remove(job.id);
    broker.publish(stopped);
    tracing::info!(job_id = job.id, name = %job.name, "job stopped");
}

/// Closes `handle`, reporting a panicking `close` as an error.
async fn close_listener<L: Listener>(listener: &L, handle: L::Handle) -> anyhow::Result<()> {
    match AssertUnwindSafe(listener.close(handle)).catch_unwind().await {
        Ok(res) => res,
        Err(panic) => Err(anyhow::anyhow!(
            "close panicked: {}",
            panic_message(panic.as_ref())
        )),
    }
}
