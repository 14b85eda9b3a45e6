//! # Monotonic identifier allocation.
//!
//! [`IdAllocator`] hands out strictly increasing `u32` identifiers. The job
//! registry and the event broker each own a separate instance, so job ids and
//! subscription ids are independent sequences.
//!
//! ## Rules
//! - The first value is the configured base (1 by default).
//! - Every call returns a value never returned before by the same allocator.
//! - Safe under unbounded concurrent callers (single atomic `fetch_add`).

use std::sync::atomic::{AtomicU32, Ordering};

/// Lock-free allocator of unique, increasing identifiers.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU32,
}

impl IdAllocator {
    /// Creates an allocator whose first identifier is `1`.
    pub const fn new() -> Self {
        Self::starting_at(1)
    }

    /// Creates an allocator whose first identifier is `base`.
    pub const fn starting_at(base: u32) -> Self {
        Self {
            next: AtomicU32::new(base),
        }
    }

    /// Returns the next identifier.
    ///
    /// # Panics
    /// Panics if the `u32` space is exhausted; wrapping would hand out a
    /// duplicate, which callers treat as unrecoverable.
    pub fn next(&self) -> u32 {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        assert!(id != u32::MAX, "identifier space exhausted");
        id
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
