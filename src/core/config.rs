//! # Server configuration.
//!
//! Provides [`Config`] centralized settings for the job server.
//!
//! ## Sentinel values
//! - `grace = 0s` → shutdown signals every job but does not wait for them
//! - `subscriber_capacity = 0` → clamped to 1
//! - `subscriber_capacity` above [`MAX_CAPACITY`](crate::MAX_CAPACITY) → clamped to it

use std::time::Duration;

use crate::events::MAX_CAPACITY;

/// Configuration for the job server.
///
/// ## Field semantics
/// - `grace`: Maximum wait for all jobs to stop during [`Server::shutdown`](crate::Server::shutdown)
/// - `subscriber_capacity`: Per-subscription queue size for [`Server::subscribe`](crate::Server::subscribe)
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time to wait for every job's supervising task to finish
    /// after shutdown signalled them.
    ///
    /// If exceeded, shutdown returns `RuntimeError::GraceExceeded` listing
    /// the jobs still registered.
    pub grace: Duration,

    /// Capacity of each subscription's bounded delivery queue.
    ///
    /// A subscriber that falls more than this many events behind loses the
    /// newest events until it catches up. Clamped to `1..=MAX_CAPACITY`.
    pub subscriber_capacity: usize,
}

impl Config {
    /// Returns the subscriber capacity clamped to `1..=MAX_CAPACITY`.
    #[inline]
    pub fn subscriber_capacity_clamped(&self) -> usize {
        self.subscriber_capacity.clamp(1, MAX_CAPACITY)
    }

    /// Returns the shutdown grace period as an `Option`.
    ///
    /// - `None` → do not wait
    /// - `Some(d)` → wait up to `d`
    #[inline]
    pub fn shutdown_grace(&self) -> Option<Duration> {
        if self.grace == Duration::ZERO {
            None
        } else {
            Some(self.grace)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `grace = 10s`
    /// - `subscriber_capacity = 1024`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(10),
            subscriber_capacity: 1024,
        }
    }
}
