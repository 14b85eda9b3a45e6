//! # Job registry - the single source of truth for what is running.
//!
//! [`JobRegistry`] maps [`JobId`] → `Arc<Job>` behind one mutex. Every
//! operation takes the lock once, does bounded work, and releases it; nothing
//! here awaits.
//!
//! ## Architecture
//! ```text
//! Server::start_job ──► next_id() ──► Job::new ──► add(job)
//! Server::stop_job  ──► get(id)   ──► job.stop()
//! supervising task  ──► remove(id)  (last step before JobStopped)
//! console           ──► list()      (sorted snapshot)
//! ```
//!
//! ## Rules
//! - One lock for the whole map (invariants are registry-wide).
//! - `add` with a live duplicate id is a caller defect and panics.
//! - `remove` of an absent id is a no-op (stop races are expected).
//! - `list` copies `Arc`s out under the lock, so callers get a consistent
//!   point-in-time snapshot ordered by id.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::IdAllocator;

use super::job::{Job, JobId};

/// Concurrency-safe store of all currently running jobs.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Mutex<BTreeMap<JobId, Arc<Job>>>,
    ids: IdAllocator,
}

impl JobRegistry {
    /// Creates an empty registry whose first job id is `1`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the identifier for the next job.
    pub fn next_id(&self) -> JobId {
        self.ids.next()
    }

    /// Inserts a fully constructed job.
    ///
    /// # Panics
    /// Panics if a live job already uses the same id. Ids come from
    /// [`next_id`](Self::next_id), so a collision means registry state can no
    /// longer be trusted.
    pub fn add(&self, job: Arc<Job>) {
        let id = job.id;
        let prev = self.lock().insert(id, job);
        assert!(prev.is_none(), "job registry: duplicate job id {id}");
    }

    /// Removes the job with `id`, returning it if it was present.
    pub fn remove(&self, id: JobId) -> Option<Arc<Job>> {
        self.lock().remove(&id)
    }

    /// Point lookup.
    pub fn get(&self, id: JobId) -> Option<Arc<Job>> {
        self.lock().get(&id).cloned()
    }

    /// True if a job with `id` is registered.
    pub fn contains(&self, id: JobId) -> bool {
        self.lock().contains_key(&id)
    }

    /// Snapshot of all jobs, sorted by id.
    pub fn list(&self) -> Vec<Arc<Job>> {
        self.lock().values().cloned().collect()
    }

    /// Snapshot of registered ids, sorted.
    pub fn ids(&self) -> Vec<JobId> {
        self.lock().keys().copied().collect()
    }

    /// Number of registered jobs.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if no job is registered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Critical sections never leave the map half-updated, so a poisoned lock
    // still guards consistent data.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<JobId, Arc<Job>>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
