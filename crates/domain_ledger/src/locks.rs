//! Per-student write serialization
//!
//! Entry creation reads the student's balance, computes the post-entry
//! balance, and writes the new entry. Two concurrent creations for the same
//! student must not interleave between the read and the write, or both will
//! compute a running balance that ignores the other's effect. Writes for
//! different students do not contend.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use core_kernel::StudentId;

/// Async lock map keyed by student
///
/// `acquire` hands out an owned guard for the student's lock; holding the
/// guard serializes all entry-creation and reversal work for that student.
/// Locks are created on first use and kept for the lifetime of the map.
#[derive(Debug, Default)]
pub struct StudentLocks {
    locks: Mutex<HashMap<StudentId, Arc<Mutex<()>>>>,
}

impl StudentLocks {
    /// Creates an empty lock map
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for a student, waiting if another writer holds it
    pub async fn acquire(&self, student_id: StudentId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(
                locks
                    .entry(student_id)
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };

        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_same_student_serializes() {
        let locks = StudentLocks::new();
        let student = StudentId::new_v7();

        let guard = locks.acquire(student).await;

        // Second acquisition must block until the guard drops
        let blocked = timeout(Duration::from_millis(50), locks.acquire(student)).await;
        assert!(blocked.is_err());

        drop(guard);

        let unblocked = timeout(Duration::from_millis(50), locks.acquire(student)).await;
        assert!(unblocked.is_ok());
    }

    #[tokio::test]
    async fn test_different_students_do_not_contend() {
        let locks = StudentLocks::new();

        let _guard_a = locks.acquire(StudentId::new_v7()).await;

        let guard_b = timeout(Duration::from_millis(50), locks.acquire(StudentId::new_v7())).await;
        assert!(guard_b.is_ok());
    }

    #[tokio::test]
    async fn test_reacquire_after_release() {
        let locks = StudentLocks::new();
        let student = StudentId::new_v7();

        for _ in 0..3 {
            let guard = locks.acquire(student).await;
            drop(guard);
        }
    }
}
