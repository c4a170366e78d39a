//! Global entry-number sequence
//!
//! Every ledger entry carries a ledger-wide entry number forming a single
//! strict total order across all students. Numbers are handed out by an
//! atomic counter; a read-then-increment scan over the store is a race under
//! concurrent writers and is not used anywhere.

use std::sync::atomic::{AtomicU64, Ordering};

/// Allocator for globally unique, strictly increasing entry numbers
///
/// The counter is seeded at service construction from the highest entry
/// number already persisted, so restarts continue the sequence instead of
/// reusing values. The database schema carries a UNIQUE constraint on the
/// column as a backstop.
#[derive(Debug)]
pub struct SequenceGenerator {
    last_issued: AtomicU64,
}

impl SequenceGenerator {
    /// Creates a generator whose first issued number is 1
    pub fn new() -> Self {
        Self::starting_after(0)
    }

    /// Creates a generator that continues after a previously issued number
    pub fn starting_after(last_issued: u64) -> Self {
        Self {
            last_issued: AtomicU64::new(last_issued),
        }
    }

    /// Allocates the next entry number
    ///
    /// Each call returns a value strictly greater than every previously
    /// issued value, including under concurrent callers.
    pub fn next(&self) -> u64 {
        self.last_issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the most recently issued number (0 if none yet)
    pub fn last_issued(&self) -> u64 {
        self.last_issued.load(Ordering::SeqCst)
    }
}

impl Default for SequenceGenerator {
    fn default() -> Self {
        Self::new()
    }
}
