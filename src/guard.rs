use std::sync::atomic::{AtomicUsize, Ordering::*};

use crate::error::SyncError;

const EXCLUSIVE: usize = 1 << (usize::BITS - 1);

/// Tracks the borrows handed out for a slot: a count of shared borrows, or
/// the high bit when borrowed exclusively.
pub struct BorrowFlag { state: AtomicUsize }

impl BorrowFlag {
    pub const fn new() -> Self {
        BorrowFlag { state: AtomicUsize::new(0) }
    }

    pub fn shared(&self) -> Result<SharedGuard<'_>, SyncError> {
        let previous = self.state.fetch_add(1, Acquire);
        if previous & EXCLUSIVE != 0 {
            self.state.fetch_sub(1, Release);
            return Err(SyncError::AlreadyBorrowed);
        }
        Ok(SharedGuard { state: &self.state })
    }

    pub fn exclusive(&self) -> Result<ExclusiveGuard<'_>, SyncError> {
        self.state
            .compare_exchange(0, EXCLUSIVE, Acquire, Relaxed)
            .map(|_| ExclusiveGuard { state: &self.state })
            .map_err(|_| SyncError::AlreadyBorrowed)
    }
}

pub struct SharedGuard<'a> { state: &'a AtomicUsize }

impl Drop for SharedGuard<'_> {
    fn drop(&mut self) {
        self.state.fetch_sub(1, Release);
    }
}

pub struct ExclusiveGuard<'a> { state: &'a AtomicUsize }

impl Drop for ExclusiveGuard<'_> {
    fn drop(&mut self) {
        // failed shared attempts may still be backing out their increment
        self.state.fetch_sub(EXCLUSIVE, Release);
    }
}
