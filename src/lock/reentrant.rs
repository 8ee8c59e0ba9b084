use parking_lot::ReentrantMutex;

use crate::sync::Synchronizer;

/// Like [`ExclusiveLock`](super::ExclusiveLock), but the owning thread may
/// call `read` and `write` again from inside a running operation. The lock is
/// given up once the outermost operation returns.
pub struct ReentrantLock { lock: ReentrantMutex<()> }

impl ReentrantLock {
    pub fn new() -> Self {
        ReentrantLock { lock: ReentrantMutex::new(()) }
    }
}

impl Default for ReentrantLock {
    fn default() -> Self { Self::new() }
}

impl Synchronizer for ReentrantLock {
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
