use parking_lot::Mutex;

use crate::sync::Synchronizer;

/// One mutex shared by reads and writes.
///
/// Calling back into the same `ExclusiveLock` from inside an operation
/// deadlocks the calling thread. Use [`ReentrantLock`](super::ReentrantLock)
/// when operations need to nest.
pub struct ExclusiveLock { lock: Mutex<()> }

impl ExclusiveLock {
    pub fn new() -> Self {
        ExclusiveLock { lock: Mutex::new(()) }
    }
}

impl Default for ExclusiveLock {
    fn default() -> Self { Self::new() }
}

impl Synchronizer for ExclusiveLock {
    fn read<T, F>(&self, operation: F) -> T
    where F: FnOnce() -> T + Send, T: Send {
        let _guard = self.lock.lock();
        operation()
    }
    fn write<F>(&self, operation: F)
    where F: FnOnce() + Send {
        let _guard = self.lock.lock();
        operation()
    }
}
